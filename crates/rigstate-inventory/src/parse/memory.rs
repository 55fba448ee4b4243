//! System memory usage and DIMM handles

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::parse::require;

/// The `Mem:` row of `free --mega`, in MB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub total_mb: u64,
    pub used_mb: u64,
    pub free_mb: u64,
}

/// Parse `free --mega`
///
/// # Errors
///
/// Returns a parse failure when the `Mem:` row is missing or short.
pub fn parse_free(text: &str) -> Result<MemoryUsage, InventoryError> {
    let row = require(
        text.lines().find(|line| line.trim_start().starts_with("Mem:")),
        "free",
        "no Mem: row",
    )?;
    let values: Vec<u64> = row
        .split_whitespace()
        .skip(1)
        .take(3)
        .filter_map(|v| v.parse().ok())
        .collect();

    match values.as_slice() {
        [total_mb, used_mb, free_mb] => Ok(MemoryUsage {
            total_mb: *total_mb,
            used_mb: *used_mb,
            free_mb: *free_mb,
        }),
        _ => Err(InventoryError::parse("free", "Mem: row has too few values")),
    }
}

/// Handles of the `Memory Device` blocks in `dmidecode -t memory`
///
/// Each DIMM slot, populated or not, is one handle.
#[must_use]
pub fn parse_dmidecode_handles(text: &str) -> Vec<String> {
    let mut handles = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("Handle ") {
            current = rest.split(',').next().map(|h| h.trim().to_string());
            continue;
        }
        if line.trim() == "Memory Device"
            && let Some(handle) = current.take()
        {
            handles.push(handle);
        }
    }

    handles
}
