//! System size normalization.
//!
//! Sizes arrive from forms and spreadsheets as either numbers or free text
//! ("250", "1.2 MWp", "1,250 kWp"). Everything is normalized to kWp.
//! Unparseable input normalizes to zero instead of failing.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CarbonError;

const KWP_PER_MWP: Decimal = dec!(1000);

/// Beyond this no non-zero value is representable as a Decimal.
const MAX_EXPONENT: u32 = 28;

/// Nameplate capacity unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityUnit {
    #[default]
    Kwp,
    Mwp,
}

impl CapacityUnit {
    fn multiplier(self) -> Decimal {
        match self {
            Self::Kwp => Decimal::ONE,
            Self::Mwp => KWP_PER_MWP,
        }
    }
}

impl fmt::Display for CapacityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kwp => write!(f, "kWp"),
            Self::Mwp => write!(f, "MWp"),
        }
    }
}

impl FromStr for CapacityUnit {
    type Err = CarbonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kwp" | "kw" => Ok(Self::Kwp),
            "mwp" | "mw" => Ok(Self::Mwp),
            other => Err(CarbonError::InvalidInput {
                field: "unit".into(),
                reason: format!("Unknown capacity unit '{other}'. Expected kWp or MWp"),
            }),
        }
    }
}

/// A raw system size as captured from user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemSize {
    Number(Decimal),
    Text(String),
}

impl From<Decimal> for SystemSize {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for SystemSize {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SystemSize {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl SystemSize {
    /// Size in kWp. See [`normalize_size`].
    pub fn to_kwp(&self, unit: Option<CapacityUnit>) -> Decimal {
        normalize_size(self, unit)
    }
}

/// Normalize a size to kWp.
///
/// Text containing "mw" (any case) is read as MWp. For plain numbers, or text
/// without a unit suffix, the explicit `unit` hint decides (kWp when absent).
/// The result is never negative. Sizes too large to represent in kWp
/// normalize to zero, like unparseable input.
pub fn normalize_size(size: &SystemSize, unit: Option<CapacityUnit>) -> Decimal {
    let kwp = match size {
        SystemSize::Number(value) => value.checked_mul(unit.unwrap_or_default().multiplier()),
        SystemSize::Text(text) => {
            let Some(value) = parse_leading_number(text) else {
                return Decimal::ZERO;
            };
            let unit = if text.to_lowercase().contains("mw") {
                CapacityUnit::Mwp
            } else {
                unit.unwrap_or_default()
            };
            value.checked_mul(unit.multiplier())
        }
    };
    kwp.unwrap_or(Decimal::ZERO).max(Decimal::ZERO)
}

/// Parse the numeric prefix of `text`, ignoring thousands separators.
///
/// "10 MWp" -> 10, "1,250.5kWp" -> 1250.5, "1.2e3" -> 1200, "abc" -> None.
/// An `e` only counts as an exponent when digits follow it.
fn parse_leading_number(text: &str) -> Option<Decimal> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let bytes = cleaned.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut seen_digit = false;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    let mantissa = cleaned[..end].trim_end_matches('.');

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let digits = bytes[end + 1 + sign..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 {
            let exponent: i32 = cleaned[end + 1..end + 1 + sign + digits]
                .trim_start_matches('+')
                .parse()
                .ok()?;
            return Decimal::from_str(mantissa)
                .ok()
                .and_then(|m| scale_by_pow10(m, exponent));
        }
    }
    Decimal::from_str(mantissa).ok()
}

/// `value x 10^exponent`, or `None` when the result does not fit.
fn scale_by_pow10(value: Decimal, exponent: i32) -> Option<Decimal> {
    if exponent.unsigned_abs() > MAX_EXPONENT {
        return if value.is_zero() { Some(value) } else { None };
    }
    let ten = dec!(10);
    (0..exponent.unsigned_abs()).try_fold(value, |acc, _| {
        if exponent > 0 {
            acc.checked_mul(ten)
        } else {
            acc.checked_div(ten)
        }
    })
}
