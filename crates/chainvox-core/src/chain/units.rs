//! Hex quantity parsing and unit formatting for JSON-RPC values.

use crate::types::ChainError;

/// Wei per ether
const WEI_PER_ETH_DECIMALS: u32 = 18;

/// Wei per gwei
const WEI_PER_GWEI: f64 = 1e9;

/// Parse a `0x`-prefixed quantity. Empty `0x` is zero.
pub fn parse_hex_u128(value: &str) -> Result<u128, ChainError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| ChainError::Malformed(format!("expected hex quantity, got '{}'", value)))?;

    if digits.is_empty() {
        return Ok(0);
    }

    u128::from_str_radix(digits, 16)
        .map_err(|e| ChainError::Malformed(format!("bad hex quantity '{}': {}", value, e)))
}

/// Parse a quantity that must fit a u64 (nonces, block numbers)
pub fn parse_hex_u64(value: &str) -> Result<u64, ChainError> {
    let wide = parse_hex_u128(value)?;
    u64::try_from(wide).map_err(|_| ChainError::Malformed(format!("quantity '{}' out of range", value)))
}

/// True when the hex quantity is zero (e.g. "0x0", "0x000...")
pub fn is_zero_hex(value: &str) -> bool {
    value
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .chars()
        .all(|c| c == '0')
}

/// Render an integer amount scaled by `decimals` without float rounding.
/// `format_units(1_500_000_000_000_000_000, 18)` -> "1.5"
pub fn format_units(amount: u128, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }

    let Some(scale) = 10u128.checked_pow(decimals) else {
        // More decimals than u128 can scale: the value is below one display unit
        let digits = amount.to_string();
        let padded = format!("{}{}", "0".repeat(decimals as usize - digits.len().min(decimals as usize)), digits);
        let fraction = padded.trim_end_matches('0');
        return if fraction.is_empty() {
            "0".to_string()
        } else {
            format!("0.{}", fraction)
        };
    };

    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }

    let fraction = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Wei hex quantity -> ETH decimal string
pub fn wei_hex_to_eth(value: &str) -> Result<String, ChainError> {
    Ok(format_units(parse_hex_u128(value)?, WEI_PER_ETH_DECIMALS))
}

/// Wei hex quantity -> "x.xx Gwei"
pub fn wei_hex_to_gwei_label(value: &str) -> Result<String, ChainError> {
    let wei = parse_hex_u128(value)?;
    Ok(format!("{:.2} Gwei", wei as f64 / WEI_PER_GWEI))
}

/// Hex quantity -> decimal string, keeping the original text if it doesn't fit
pub fn hex_to_decimal_lossless(value: &str) -> String {
    parse_hex_u128(value)
        .map(|n| n.to_string())
        .unwrap_or_else(|_| value.to_string())
}
