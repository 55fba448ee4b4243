//! Error types for rigstate-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the host
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Program is not installed or not on `PATH`
    #[error("program not found: {0}")]
    NotFound(String),

    /// Command exited with a non-zero status
    #[error("command execution failed: {status} - {stderr}")]
    CommandFailed {
        /// Exit status code
        status: i32,
        /// Stderr output
        stderr: String,
    },

    /// Command timed out and was killed
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error during execution or file access
    #[error("I/O error: {0}")]
    IoError(String),

    /// The caller lacks the rights for a file or program
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl ExecError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecError::Timeout { .. } | ExecError::IoError(_))
    }

    /// Check if the error means a tool or file simply does not exist on this host
    #[must_use]
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, ExecError::NotFound(_))
    }

    /// Map a `std::io::Error` for `what` onto the matching variant
    pub(crate) fn from_io(what: &str, e: &std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ExecError::NotFound(what.to_string()),
            std::io::ErrorKind::PermissionDenied => ExecError::PermissionDenied(what.to_string()),
            _ => ExecError::IoError(format!("{what}: {e}")),
        }
    }
}
