//! rigstate-inventory: hardware inventory and GPU control
//!
//! Turns the `lshw` device tree into deduplicated per-domain records with
//! stable GUIDs, refreshes their sensor readings, and applies validated GPU
//! control requests through vendor backends.

pub mod collab;
pub mod context;
pub mod control;
pub mod error;
pub mod extract;
pub mod field;
pub mod guid;
pub mod identity;
pub mod inventory;
pub mod merge;
pub mod normalize;
pub mod parse;
pub mod quirks;
pub mod snapshot;
pub mod system;
pub mod telemetry;
pub mod tree;
pub mod types;
pub mod vendor;

pub use collab::Collaborators;
pub use context::ScanContext;
pub use control::{Knob, OverclockOutcome};
pub use error::InventoryError;
pub use field::Field;
pub use guid::Guid;
pub use inventory::{Inventory, InventoryScanner};
pub use quirks::QuirkTable;
pub use snapshot::{DynamicSnapshot, StaticSnapshot};
pub use system::{OsInfo, SystemStatus};
pub use tree::DeviceNode;
