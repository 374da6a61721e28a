//! Day-level pro-rata for the commissioning year.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::CarbonError;
use crate::CarbonResult;

/// 365 or 366.
pub fn days_in_year(year: i32) -> i64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Days from `date` through Dec 31 of its year, both ends inclusive.
pub fn remaining_days(date: NaiveDate) -> i64 {
    let year_end = NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date);
    (year_end - date).num_days() + 1
}

/// Share of `year` during which a system commissioned on `commission_date`
/// operates: 0 before the commissioning year, 1 after it, and
/// remaining_days / days_in_year within it.
pub fn operating_fraction(commission_date: Option<NaiveDate>, year: i32) -> Decimal {
    let Some(date) = commission_date else {
        return Decimal::ONE;
    };
    match year.cmp(&date.year()) {
        std::cmp::Ordering::Less => Decimal::ZERO,
        std::cmp::Ordering::Greater => Decimal::ONE,
        std::cmp::Ordering::Equal => {
            Decimal::from(remaining_days(date)) / Decimal::from(days_in_year(year))
        }
    }
}

/// Move commissioning dates earlier than Jan 1 of `floor_year` up to it.
pub fn floor_commission_date(date: NaiveDate, floor_year: i32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(floor_year, 1, 1) {
        Some(floor) if date < floor => floor,
        _ => date,
    }
}

/// Parse a `YYYY-MM-DD` commissioning date.
pub fn parse_commission_date(s: &str) -> CarbonResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
        CarbonError::DateError(format!("Invalid commissioning date '{s}': {e}"))
    })
}
