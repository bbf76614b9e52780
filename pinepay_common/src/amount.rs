use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A monetary amount, expressed in the minor unit of its currency (e.g. paisa for INR).
///
/// The provider expects order amounts as integers in the minor unit, so this is also the wire representation.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Amount(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Parses decimal strings such as `"100"`, `"100.5"` or `"100.00"`. At most two decimal places are accepted.
impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || whole.starts_with('-') || fraction.len() > 2 {
            return Err(AmountConversionError(format!("Invalid amount: {s}")));
        }
        let whole = whole.parse::<i64>().map_err(|e| AmountConversionError(format!("Invalid amount: {s}. {e}")))?;
        let cents = match fraction.len() {
            0 => 0,
            1 => 10 * parse_digits(fraction, s)?,
            _ => parse_digits(fraction, s)?,
        };
        whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Self)
            .ok_or_else(|| AmountConversionError(format!("Amount is too large: {s}")))
    }
}

fn parse_digits(digits: &str, original: &str) -> Result<i64, AmountConversionError> {
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountConversionError(format!("Invalid amount: {original}")));
    }
    digits.parse::<i64>().map_err(|e| AmountConversionError(format!("Invalid amount: {original}. {e}")))
}

impl Amount {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major_units(units: i64) -> Self {
        Self(units * 100)
    }
}
