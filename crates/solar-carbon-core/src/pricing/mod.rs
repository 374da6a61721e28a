//! Carbon price sourcing.
//!
//! Prices per tonne are configured per calendar year in an external settings
//! store. [`DynamicPriceSource`] fetches them through a [`CarbonPriceSource`],
//! keeps only the current and future years, and caches the result.

pub mod cache;
pub mod clock;
pub mod provider;
pub mod source;

use std::collections::BTreeMap;

use tracing::warn;

use crate::types::Money;

pub use cache::{PriceCache, TtlPriceCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use provider::DynamicPriceSource;
#[cfg(feature = "http")]
pub use source::HttpPriceSource;
pub use source::{CarbonPriceSource, StaticPriceSource};

/// Year -> price per tonne, as held by the settings store (string keys).
pub type RawPriceTable = BTreeMap<String, Money>;

/// Year -> price per tonne.
pub type PriceTable = BTreeMap<i32, Money>;

/// Convert a raw table into a [`PriceTable`], keeping years >= `current_year`.
///
/// Keys that are not years and negative prices are dropped with a warning.
pub fn current_and_future(raw: &RawPriceTable, current_year: i32) -> PriceTable {
    raw.iter()
        .filter_map(|(key, price)| {
            let Ok(year) = key.trim().parse::<i32>() else {
                warn!(key = %key, "ignoring carbon price with non-year key");
                return None;
            };
            if price.is_sign_negative() {
                warn!(year, %price, "ignoring negative carbon price");
                return None;
            }
            (year >= current_year).then_some((year, *price))
        })
        .collect()
}
