//! Single-value sysfs/hwmon files

use crate::error::InventoryError;

/// Integer file such as `pwm1` or `in0_input`
///
/// # Errors
///
/// Returns a parse failure when the content is not an integer.
pub fn parse_int(text: &str) -> Result<i64, InventoryError> {
    text.trim()
        .parse()
        .map_err(|e| InventoryError::parse("sysfs value", format!("{:?}: {e}", text.trim())))
}

/// Millidegree Celsius file (`temp1_input`) in whole degrees
///
/// # Errors
///
/// Returns a parse failure when the content is not an integer.
pub fn parse_millidegrees(text: &str) -> Result<i64, InventoryError> {
    parse_int(text).map(|m| m / 1000)
}

/// Microwatt file (`power1_cap`, `power1_average`) in whole watts
///
/// # Errors
///
/// Returns a parse failure when the content is not an integer.
pub fn parse_microwatts(text: &str) -> Result<i64, InventoryError> {
    parse_int(text).map(|uw| uw / 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_millidegrees("54000\n").unwrap(), 54);
        assert_eq!(parse_microwatts("186000000\n").unwrap(), 186);
        assert_eq!(parse_int(" 2 ").unwrap(), 2);
    }

    #[test]
    fn test_garbage() {
        assert!(matches!(
            parse_int("auto"),
            Err(InventoryError::ParseFailure { .. })
        ));
    }
}
