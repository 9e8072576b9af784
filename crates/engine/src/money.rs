//! Decimal-string parsing for provider amounts.
//!
//! Providers report amounts as decimal strings (`"100.00"` from YooKassa) or
//! bare integers (`"5"` stars). Everything inside the engine is an `i64`
//! number of minor units to avoid floating-point drift.

use crate::{Currency, EngineError};

/// Parses a decimal amount string into minor units for `currency`.
///
/// Accepts `.` or `,` as decimal separator. Validation rules:
/// - no sign (provider amounts are always positive)
/// - at most `currency.minor_units()` fraction digits (rejects `"12.345"`
///   for RUB and any fraction at all for XTR)
/// - rejects empty/invalid strings and overflow
pub fn parse_minor_units(s: &str, currency: Currency) -> Result<i64, EngineError> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());
    let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
    let overflow = || EngineError::InvalidAmount("amount too large".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let rest = trimmed.replace(',', ".");
    let mut parts = rest.split('.');
    let major_str = parts.next().ok_or_else(invalid)?;
    let frac_str = parts.next();

    if parts.next().is_some() {
        return Err(invalid());
    }

    if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let major: i64 = major_str.parse().map_err(|_| invalid())?;

    let digits = currency.minor_units() as usize;
    let frac: i64 = match frac_str {
        None | Some("") => 0,
        Some(frac) => {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            if frac.len() > digits {
                return Err(EngineError::InvalidAmount(format!(
                    "too many decimals for {}",
                    currency.code()
                )));
            }
            let parsed: i64 = frac.parse().map_err(|_| invalid())?;
            parsed * 10_i64.pow((digits - frac.len()) as u32)
        }
    };

    let scale = 10_i64.pow(digits as u32);
    major
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(overflow)
}

/// Formats minor units back into a decimal string (admin views, log lines).
#[must_use]
pub fn format_minor_units(amount_minor: i64, currency: Currency) -> String {
    let digits = currency.minor_units() as u32;
    if digits == 0 {
        return format!("{amount_minor} {}", currency.code());
    }
    let scale = 10_i64.pow(digits);
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    let major = abs / scale as u64;
    let frac = abs % scale as u64;
    format!(
        "{sign}{major}.{frac:0width$} {}",
        currency.code(),
        width = digits as usize
    )
}
