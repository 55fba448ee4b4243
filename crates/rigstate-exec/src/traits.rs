//! Collaborator traits
//!
//! Everything the inventory engine needs from the host goes through these
//! three seams, so tests can swap in canned command output and file trees.

use std::path::Path;
use std::time::Duration;

use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs an external program and captures its output
pub trait ProcessInvoker: Send + Sync {
    /// Run `program` with `args`, killing it once `timeout` elapses
    ///
    /// A non-zero exit status is still `Ok`; callers decide what it means.
    ///
    /// # Errors
    ///
    /// Returns an error if the program is missing, cannot be spawned, or
    /// exceeds the timeout.
    fn invoke(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandResult, ExecError>;

    /// Short name of this invoker for logs
    fn invoker_type(&self) -> &'static str;
}

/// Reads and writes small text files (sysfs, procfs, saved probe output)
pub trait FileAccess: Send + Sync {
    /// Read a whole file as UTF-8 text
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable.
    fn read_to_string(&self, path: &Path) -> Result<String, ExecError>;

    /// Replace the contents of a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for writing.
    fn write(&self, path: &Path, contents: &str) -> Result<(), ExecError>;

    /// List the entry names of a directory, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn list_dir(&self, path: &Path) -> Result<Vec<String>, ExecError>;

    /// Whether `path` exists
    fn exists(&self, path: &Path) -> bool;
}

/// Reports whether the current process may run privileged probes
pub trait PrivilegeCheck: Send + Sync {
    /// `true` when running as the superuser
    fn is_superuser(&self) -> bool;
}
