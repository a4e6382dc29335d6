//! Money input parsing and two-decimal display.
//!
//! Every figure a cashier types arrives as raw text. Parsing never fails:
//! anything that is not a non-negative number reads as zero, so the closing
//! calculator always has a value to work with and no formula can carry an
//! error forward.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Largest figure accepted anywhere on the form. Sums of a handful of
/// these stay far inside `Decimal` range, so formulas never overflow.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Round a monetary value to cents.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to cents; negative values and anything above [`MAX_AMOUNT`] read as 0.
pub fn clamp_amount(value: Decimal) -> Decimal {
    if value.is_sign_negative() || value > MAX_AMOUNT {
        return Decimal::ZERO;
    }
    round_money(value)
}

/// Parse a typed amount. Empty, non-numeric, negative and out-of-range
/// input all read as 0.
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(clamp_amount)
        .unwrap_or(Decimal::ZERO)
}

/// Parse a typed piece count. Fractions truncate, counts beyond `u32::MAX`
/// saturate; negative or non-numeric input reads as 0.
pub fn parse_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return n;
    }
    match Decimal::from_str(trimmed) {
        Ok(v) if v.is_sign_positive() => v.trunc().to_u32().unwrap_or(u32::MAX),
        _ => 0,
    }
}

/// Two-decimal display string, e.g. `52.00` or `-5.00`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = round_money(value);
    if rounded.is_zero() {
        // Avoid printing "-0.00" for a negative zero.
        return "0.00".to_string();
    }
    format!("{rounded:.2}")
}

// ---------------------------------------------------------------------------
// Raw amount fields
// ---------------------------------------------------------------------------

/// A user-entered amount kept exactly as typed.
///
/// The numeric value is derived on every read so the stored text and the
/// figure used in calculations can never drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmountInput(String);

impl AmountInput {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> Decimal {
        parse_amount(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }
}

impl From<Decimal> for AmountInput {
    fn from(value: Decimal) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for AmountInput {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for AmountInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.value()))
    }
}
