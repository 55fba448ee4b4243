//! Result types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExecError;

/// Result of a command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Exit status code (0 for success)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Combine stdout and stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Take stdout, turning a non-zero exit into an error
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::CommandFailed`] when the exit status is non-zero.
    pub fn into_stdout(self) -> Result<String, ExecError> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(ExecError::CommandFailed {
                status: self.status,
                stderr: self.stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: i32, stdout: &str, stderr: &str) -> CommandResult {
        CommandResult {
            status,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_into_stdout() {
        assert_eq!(result(0, "ok\n", "").into_stdout().unwrap(), "ok\n");

        let err = result(3, "", "boom").into_stdout().unwrap_err();
        assert!(matches!(err, ExecError::CommandFailed { status: 3, .. }));
    }

    #[test]
    fn test_combined_output() {
        assert_eq!(result(0, "a", "").combined_output(), "a");
        assert_eq!(result(0, "a", "b").combined_output(), "a\nb");
    }
}
