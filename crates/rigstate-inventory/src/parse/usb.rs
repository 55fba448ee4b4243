//! `lsusb` scraper

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// One `lsusb` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbDevice {
    pub bus: String,
    pub device: String,
    pub vendor_id: String,
    pub product_id: String,
    pub name: String,
}

/// Parse `lsusb` output
///
/// Lines have a fixed layout:
/// `Bus 001 Device 002: ID 8087:0024 Intel Corp. Integrated Rate Matching Hub`.
///
/// # Errors
///
/// Returns a parse failure for lines shorter than the fixed columns.
pub fn parse_lsusb(text: &str) -> Result<Vec<UsbDevice>, InventoryError> {
    let mut devices = Vec::new();

    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let column = |start: usize, end: usize| {
            line.get(start..end)
                .map(str::to_string)
                .ok_or_else(|| InventoryError::parse("lsusb", format!("short line: {line}")))
        };

        devices.push(UsbDevice {
            bus: column(4, 7)?,
            device: column(15, 18)?,
            vendor_id: column(23, 27)?,
            product_id: column(28, 32)?,
            name: line.get(33..).unwrap_or("").trim().to_string(),
        });
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lsusb() {
        let output = r"Bus 002 Device 001: ID 1d6b:0003 Linux Foundation 3.0 root hub
Bus 001 Device 003: ID 046d:c52b Logitech, Inc. Unifying Receiver
Bus 001 Device 004: ID 0b05:1939
";
        let devices = parse_lsusb(output).unwrap();

        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].bus, "002");
        assert_eq!(devices[1].device, "003");
        assert_eq!(devices[1].vendor_id, "046d");
        assert_eq!(devices[1].product_id, "c52b");
        assert_eq!(devices[1].name, "Logitech, Inc. Unifying Receiver");
        assert_eq!(devices[2].name, "");
    }

    #[test]
    fn test_parse_lsusb_short_line() {
        assert!(parse_lsusb("Bus 001").is_err());
    }
}
