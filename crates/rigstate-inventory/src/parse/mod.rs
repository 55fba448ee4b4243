//! Text scrapers
//!
//! One parser per command or file format. Each takes raw text and returns a
//! structured value or [`InventoryError::ParseFailure`]; none of them touch
//! the host or the inventory.

pub mod amdgpu;
pub mod clinfo;
pub mod memory;
pub mod net;
pub mod nvidia;
pub mod pci;
pub mod procfs;
pub mod storage;
pub mod sysfs;
pub mod usb;

use crate::error::InventoryError;

/// Leading (optionally signed, optionally fractional) number of a token
///
/// `"2150MHz"` gives `2150.0`, `"-0.5V"` gives `-0.5`.
pub(crate) fn leading_number(token: &str) -> Option<f64> {
    let token = token.trim();
    let end = token
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(token.len(), |(i, _)| i);
    token[..end].parse().ok()
}

/// [`leading_number`] truncated to an integer
pub(crate) fn leading_int(token: &str) -> Option<i64> {
    leading_number(token).map(|n| n as i64)
}

/// Value after the first `:` of a `label: value` line
pub(crate) fn after_colon(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, value)| value.trim())
}

pub(crate) fn require<T>(value: Option<T>, context: &str, message: &str) -> Result<T, InventoryError> {
    value.ok_or_else(|| InventoryError::parse(context, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("2150MHz"), Some(2150.0));
        assert_eq!(leading_number(" 925.000 mV"), Some(925.0));
        assert_eq!(leading_number("-1000"), Some(-1000.0));
        assert_eq!(leading_number("MHz"), None);
        assert_eq!(leading_int("38 Celsius"), Some(38));
    }
}
