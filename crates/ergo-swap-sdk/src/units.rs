//! Decimal string ⇄ base unit conversion.
//!
//! Only used at the boundary; nothing inside the engine ever sees a decimal.

use crate::asset::Amount;
use crate::error::{Error, Result};

/// Largest supported decimals: `10^38` still fits a `u128`.
pub const MAX_DECIMALS: u8 = 38;

fn pow10(decimals: u8) -> Result<Amount> {
    if decimals > MAX_DECIMALS {
        return Err(Error::InvalidAmount(format!(
            "decimals {decimals} exceeds {MAX_DECIMALS}"
        )));
    }
    Ok(10u128.pow(u32::from(decimals)))
}

/// Parse a non-negative decimal string (`"1.25"`) into base units.
///
/// Rejects signs, exponents, empty parts and more fractional digits than
/// `decimals` (no silent truncation).
pub fn parse_units(s: &str, decimals: u8) -> Result<Amount> {
    let s = s.trim();
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() || (s.contains('.') && frac_part.is_empty()) {
        return Err(Error::InvalidAmount(format!("malformed amount {s:?}")));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::InvalidAmount(format!("malformed amount {s:?}")));
    }
    if frac_part.len() > usize::from(decimals) {
        return Err(Error::InvalidAmount(format!(
            "{s:?} has more than {decimals} decimal places"
        )));
    }

    let scale = pow10(decimals)?;
    let whole: Amount = int_part
        .parse()
        .map_err(|_| Error::InvalidAmount(format!("amount {s:?} out of range")))?;

    let mut frac: Amount = 0;
    if !frac_part.is_empty() {
        let digits: Amount = frac_part
            .parse()
            .map_err(|_| Error::InvalidAmount(format!("amount {s:?} out of range")))?;
        let pad = pow10(decimals - frac_part.len() as u8)?;
        frac = digits * pad;
    }

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| Error::InvalidAmount(format!("amount {s:?} out of range")))
}

/// Render base units as a decimal string, trimming trailing fractional zeros.
pub fn format_units(amount: Amount, decimals: u8) -> Result<String> {
    let scale = pow10(decimals)?;
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return Ok(whole.to_string());
    }
    let frac = format!("{:0width$}", frac, width = usize::from(decimals));
    Ok(format!("{whole}.{}", frac.trim_end_matches('0')))
}
