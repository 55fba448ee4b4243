//! Local file access over `std::fs`

use std::path::Path;

use tracing::debug;

use crate::error::ExecError;
use crate::traits::FileAccess;

/// File collaborator backed by the real filesystem
#[derive(Debug, Clone, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new local filesystem accessor
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FileAccess for LocalFs {
    fn read_to_string(&self, path: &Path) -> Result<String, ExecError> {
        std::fs::read_to_string(path).map_err(|e| ExecError::from_io(&path.display().to_string(), &e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), ExecError> {
        debug!(path = %path.display(), contents = %contents.trim(), "writing file");
        std::fs::write(path, contents).map_err(|e| ExecError::from_io(&path.display().to_string(), &e))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, ExecError> {
        let entries = std::fs::read_dir(path)
            .map_err(|e| ExecError::from_io(&path.display().to_string(), &e))?;

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
