//! Superuser detection

use std::os::unix::fs::MetadataExt;

use tracing::warn;

use crate::traits::PrivilegeCheck;

/// Checks the effective uid of the running process
///
/// `/proc/self` is owned by the effective uid, which avoids pulling in libc.
#[derive(Debug, Clone, Default)]
pub struct ProcessPrivileges;

impl ProcessPrivileges {
    /// Create a new privilege checker
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PrivilegeCheck for ProcessPrivileges {
    fn is_superuser(&self) -> bool {
        match std::fs::metadata("/proc/self") {
            Ok(meta) => meta.uid() == 0,
            Err(e) => {
                warn!(error = %e, "cannot determine effective uid");
                false
            }
        }
    }
}
