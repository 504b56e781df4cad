//! Conversion between raw token amounts and display strings.

use crate::{TokenError, TokenInfo};
use alloy_primitives::{
    utils::{format_units, parse_units},
    U256,
};

/// Decimals assumed when the token's own precision is unknown.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Render a raw amount with `decimals` places, dropping trailing zeros.
///
/// `1_500_000` with 6 decimals renders as `"1.5"`, whole amounts render
/// without a fractional part.
pub fn format_amount(raw: U256, decimals: u8) -> Result<String, TokenError> {
    let formatted = format_units(raw, decimals).map_err(|e| TokenError::Format {
        decimals,
        reason: e.to_string(),
    })?;

    Ok(trim_fraction(formatted))
}

/// Parse a user supplied decimal amount into base units.
///
/// Rejects empty and negative input, and input with more fractional digits
/// than the token supports.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, TokenError> {
    let invalid = |reason: &str| TokenError::InvalidAmount {
        amount: amount.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("negative"));
    }

    let (int, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if int.is_empty() && frac.is_empty() {
        return Err(invalid("no digits"));
    }
    if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("not a decimal number"));
    }
    if frac.len() > decimals as usize {
        return Err(invalid(&format!("more than {decimals} decimal places")));
    }

    let int = if int.is_empty() { "0" } else { int };
    let normalized = if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}.{frac}")
    };

    parse_units(&normalized, decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| invalid(&e.to_string()))
}

/// Decimals to use for amount conversion.
///
/// Falls back to [`DEFAULT_DECIMALS`] when the token has not been read yet
/// or its decimals came back as 0 (a degraded multicall slot).
pub fn effective_decimals(info: Option<&TokenInfo>) -> u8 {
    match info.map(|info| info.decimals) {
        Some(decimals) if decimals > 0 => decimals,
        _ => DEFAULT_DECIMALS,
    }
}

fn trim_fraction(mut formatted: String) -> String {
    if formatted.contains('.') {
        let len = formatted.trim_end_matches('0').trim_end_matches('.').len();
        formatted.truncate(len);
    }
    formatted
}
