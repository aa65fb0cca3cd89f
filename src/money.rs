//! Conversion between human decimal amounts and integer minor units.
//!
//! Every stored balance and every piece of arithmetic in this crate operates
//! on `i64` minor units; decimals only appear at the edges.

use crate::errors::{CoreError, CoreResult};

/// Number of decimal digits carried by the minor-unit representation.
pub const MINOR_SCALE: u32 = 2;

const MINOR_FACTOR: f64 = 100.0;

/// Converts a decimal amount into minor units, rounding to the nearest unit.
///
/// Values representable at [`MINOR_SCALE`] digits round-trip exactly through
/// [`to_decimal`].
pub fn to_minor(decimal: f64) -> CoreResult<i64> {
    if !decimal.is_finite() {
        return Err(CoreError::Validation(
            "amount must be a finite number".into(),
        ));
    }
    let scaled = (decimal * MINOR_FACTOR).round();
    if scaled < i64::MIN as f64 || scaled > i64::MAX as f64 {
        return Err(CoreError::Validation(format!(
            "amount {} is out of range",
            decimal
        )));
    }
    Ok(scaled as i64)
}

/// Converts minor units back to a decimal amount.
pub fn to_decimal(minor: i64) -> f64 {
    minor as f64 / MINOR_FACTOR
}

/// Renders minor units as a plain decimal string, e.g. `-1250` -> `"-12.50"`.
pub fn format_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
