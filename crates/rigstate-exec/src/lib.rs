//! rigstate-exec: Host collaborator abstraction
//!
//! Provides the narrow interfaces the inventory engine uses to reach the
//! machine: running external programs with a timeout, reading and writing
//! sysfs/procfs files, and checking for superuser privilege.

pub mod error;
pub mod fs;
pub mod local;
pub mod privilege;
pub mod result;
pub mod traits;

pub use error::ExecError;
pub use fs::LocalFs;
pub use local::LocalInvoker;
pub use privilege::ProcessPrivileges;
pub use result::CommandResult;
pub use traits::{FileAccess, PrivilegeCheck, ProcessInvoker};
