//! Per-domain extractors
//!
//! Each domain module has the same shape:
//!
//! * `extract(node, records, ctx)`: fold one tree node into the record list
//!   using the merge core and the identity engine. Pure.
//! * `scan(ctx)`: run `extract` over the relevant node classes in order.
//! * `finalize(records, ctx)`: derivations that need the whole list or the
//!   context tables. Pure.
//! * `enrich(records, io)` (where needed): static attributes that only the
//!   live host can provide.

pub mod cpu;
pub mod drive;
pub mod gpu;
pub mod motherboard;
pub mod network;
pub mod ram;

use crate::tree::DeviceNode;

/// Hz to whole MHz
pub(crate) fn hz_to_mhz(hz: u64) -> u64 {
    hz / 1_000_000
}

/// Bytes to whole MB (binary)
pub(crate) fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / 1024 / 1024
}

/// Numeric configuration value
pub(crate) fn config_u32(node: &DeviceNode, key: &str) -> Option<u32> {
    node.config(key).trim().parse().ok()
}
