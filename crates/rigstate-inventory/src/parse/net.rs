//! Interface addresses

use crate::error::InventoryError;
use crate::parse::require;

/// First IPv4 address from `ip -4 -o addr show dev <if>`, without prefix length
///
/// # Errors
///
/// Returns a parse failure when the interface has no `inet` address.
pub fn parse_ipv4(text: &str) -> Result<String, InventoryError> {
    let address = text.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens.find(|t| *t == "inet")?;
        tokens.next().map(|cidr| cidr.split('/').next().unwrap_or(cidr).to_string())
    });
    require(address, "ip addr", "no inet address")
}
