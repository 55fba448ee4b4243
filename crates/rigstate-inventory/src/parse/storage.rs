//! Drive health and filesystem usage

use crate::error::InventoryError;
use crate::parse::{after_colon, leading_int, require};

/// Drive temperature from `smartctl -a`
///
/// NVMe drives print `Temperature: 38 Celsius`; ATA drives report it in the
/// raw value column of the `Temperature_Celsius` attribute.
///
/// # Errors
///
/// Returns a parse failure when neither form is present.
pub fn parse_smartctl_temperature(text: &str) -> Result<i64, InventoryError> {
    let nvme = text
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("Temperature:"))
        .and_then(after_colon)
        .and_then(leading_int);

    let ata = || {
        text.lines()
            .find(|line| line.contains("Temperature_Celsius"))
            .and_then(|line| line.split_whitespace().nth(9))
            .and_then(leading_int)
    };

    require(nvme.or_else(ata), "smartctl", "no temperature reading")
}

/// Filesystem bytes available and used under one block device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockUsage {
    pub available: u64,
    pub used: u64,
}

/// `true` when the block device `name` is `device` itself or one of its
/// namespaces or partitions
///
/// `nvme0` owns `nvme0n1p2` but not `nvme10n1`; `sda` owns `sda1` but not
/// `sdaa`.
fn belongs_to(name: &str, device: &str) -> bool {
    let Some(rest) = name.strip_prefix(device) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    if device.ends_with(|c: char| c.is_ascii_digit()) {
        let mut chars = rest.chars();
        matches!(chars.next(), Some('n' | 'p')) && chars.next().is_some_and(|c| c.is_ascii_digit())
    } else {
        rest.starts_with(|c: char| c.is_ascii_digit())
    }
}

/// Sum `lsblk -b -n -l -o NAME,FSAVAIL,FSUSED` rows belonging to `device`
///
/// The listing covers every block device; rows of other devices and rows
/// without a mounted filesystem are skipped.
///
/// # Errors
///
/// Returns a parse failure when no row of `device` carries usage figures.
pub fn parse_lsblk_usage(text: &str, device: &str) -> Result<BlockUsage, InventoryError> {
    let mut usage = BlockUsage::default();
    let mut seen = false;

    for line in text.lines() {
        let mut cols = line.split_whitespace();
        let (Some(name), Some(avail), Some(used)) = (cols.next(), cols.next(), cols.next()) else {
            continue;
        };
        if !belongs_to(name, device) {
            continue;
        }
        if let (Ok(avail), Ok(used)) = (avail.parse::<u64>(), used.parse::<u64>()) {
            usage.available += avail;
            usage.used += used;
            seen = true;
        }
    }

    if seen {
        Ok(usage)
    } else {
        Err(InventoryError::parse("lsblk", format!("no mounted filesystem on {device}")))
    }
}
