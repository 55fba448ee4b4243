//! Error types for rigstate-inventory

use rigstate_exec::ExecError;
use thiserror::Error;

/// Errors that can occur while building or driving the inventory
///
/// None of these are fatal to the host process: callers degrade the affected
/// field to unknown, or the affected domain to empty.
#[derive(Error, Debug, Clone)]
pub enum InventoryError {
    /// An external program, file or vendor tool failed or timed out
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// Command output or sysfs content did not have the expected shape
    #[error("failed to parse {context}: {message}")]
    ParseFailure {
        /// What was being parsed (command or file)
        context: String,
        /// What went wrong
        message: String,
    },

    /// Control request value outside the device's advertised range
    #[error("{knob} value {value} outside [{min}, {max}]")]
    ValidationFailure {
        /// Request field name
        knob: String,
        /// Requested value
        value: i64,
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },

    /// The device's vendor backend has no setter for this knob
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The hardware probe needs superuser rights
    #[error("superuser privilege required: {0}")]
    PrivilegeFailure(String),

    /// The probe output is not a usable device tree
    #[error("invalid device tree: {0}")]
    InvalidTree(String),
}

impl InventoryError {
    /// Build a [`InventoryError::ParseFailure`]
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        InventoryError::ParseFailure {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::CollaboratorUnavailable(_))
    }

    /// Check if no retry can succeed until the host changes (missing
    /// privilege, a probe that prints no device tree)
    #[must_use]
    pub fn aborts_scan(&self) -> bool {
        matches!(
            self,
            InventoryError::PrivilegeFailure(_) | InventoryError::InvalidTree(_)
        )
    }
}

impl From<ExecError> for InventoryError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::PermissionDenied(what) => InventoryError::PrivilegeFailure(what),
            other => InventoryError::CollaboratorUnavailable(other.to_string()),
        }
    }
}
