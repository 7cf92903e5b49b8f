//! # Link discovery
//!
//! Crazyflies are found by scanning the radio channels for a given 5 bytes radio address. The factory default
//! address is `E7E7E7E7E7`.

use crate::{Error, Result};

/// Factory default radio address
pub const DEFAULT_ADDRESS: [u8; 5] = [0xE7; 5];

/// List the URIs of all the Crazyflies answering on `address`
pub async fn scan(link_context: &crazyflie_link::LinkContext, address: [u8; 5]) -> Result<Vec<String>> {
    log::debug!("Scanning for address {}", format_address(&address));

    let found = link_context.scan(address).await?;

    log::debug!("{} link(s) found", found.len());
    Ok(found)
}

/// Parse a radio address written as 10 hexadecimal digits, for example `E7E7E7E7E7`
///
/// An optional `0x` prefix is accepted.
pub fn parse_address(text: &str) -> Result<[u8; 5]> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    if digits.len() != 10 || !digits.is_ascii() {
        return Err(Error::InvalidAddress(text.to_owned()));
    }

    let mut address = [0u8; 5];
    for (i, byte) in address.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[2 * i..2 * i + 2], 16)
            .map_err(|_| Error::InvalidAddress(text.to_owned()))?;
    }

    Ok(address)
}

/// Format a radio address as 10 upper case hexadecimal digits
pub fn format_address(address: &[u8; 5]) -> String {
    address.iter().map(|b| format!("{:02X}", b)).collect()
}
