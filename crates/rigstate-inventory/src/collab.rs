//! Collaborator bundle handed to every host-facing step

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rigstate_exec::{ExecError, FileAccess, LocalFs, LocalInvoker, PrivilegeCheck, ProcessInvoker, ProcessPrivileges};
use tracing::{debug, warn};

use crate::error::InventoryError;

/// Default timeout for one external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Process, file and privilege collaborators plus the command timeout
///
/// The `run`/`read` helpers never fail: a missing tool, a non-zero exit or a
/// timeout is logged and reported as `None`.
#[derive(Clone)]
pub struct Collaborators {
    invoker: Arc<dyn ProcessInvoker>,
    files: Arc<dyn FileAccess>,
    privileges: Arc<dyn PrivilegeCheck>,
    timeout: Duration,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("invoker", &self.invoker.invoker_type())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Bundle explicit collaborators
    pub fn new(
        invoker: Arc<dyn ProcessInvoker>,
        files: Arc<dyn FileAccess>,
        privileges: Arc<dyn PrivilegeCheck>,
    ) -> Self {
        Self {
            invoker,
            files,
            privileges,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Collaborators backed by this machine
    #[must_use]
    pub fn local() -> Self {
        Self::new(
            Arc::new(LocalInvoker::new()),
            Arc::new(LocalFs::new()),
            Arc::new(ProcessPrivileges::new()),
        )
    }

    /// Set the per-command timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.privileges.is_superuser()
    }

    /// Run a command and return its stdout
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::CollaboratorUnavailable`] when the program is
    /// missing, times out or exits non-zero.
    pub fn try_run(&self, program: &str, args: &[&str]) -> Result<String, InventoryError> {
        let result = self.invoker.invoke(program, args, self.timeout)?;
        Ok(result.into_stdout()?)
    }

    /// Run a command, logging and swallowing any failure
    pub fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        match self.try_run(program, args) {
            Ok(stdout) => Some(stdout),
            Err(e) => {
                warn!(error = %e, program = %program, ?args, "command unavailable");
                None
            }
        }
    }

    /// Run a command whose exit status does not mean failure, returning its
    /// stdout whatever the status
    ///
    /// A missing tool or a timeout still yields `None`, as does empty output.
    pub fn run_any_status(&self, program: &str, args: &[&str]) -> Option<String> {
        match self.invoker.invoke(program, args, self.timeout) {
            Ok(result) => {
                if !result.success() {
                    debug!(program = %program, status = result.status, "non-zero exit, keeping output");
                }
                Some(result.stdout).filter(|stdout| !stdout.trim().is_empty())
            }
            Err(e) => {
                warn!(error = %e, program = %program, ?args, "command unavailable");
                None
            }
        }
    }

    /// Read a text file
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing or unreadable.
    pub fn try_read(&self, path: &Path) -> Result<String, InventoryError> {
        Ok(self.files.read_to_string(path)?)
    }

    /// Read a text file, logging and swallowing any failure
    ///
    /// Missing files are common (optional sysfs attributes) and only logged
    /// at debug level.
    pub fn read(&self, path: &Path) -> Option<String> {
        match self.files.read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(ExecError::NotFound(_)) => {
                debug!(path = %path.display(), "file not present");
                None
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "file unreadable");
                None
            }
        }
    }

    /// Write a text file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write(&self, path: &Path, contents: &str) -> Result<(), InventoryError> {
        Ok(self.files.write(path, contents)?)
    }

    /// Directory entry names, empty on failure
    pub fn list(&self, path: &Path) -> Vec<String> {
        self.files.list_dir(path).unwrap_or_else(|e| {
            debug!(error = %e, path = %path.display(), "directory not listable");
            Vec::new()
        })
    }

    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        self.files.exists(path)
    }
}
