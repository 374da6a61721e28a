//! Year-by-year revenue projection against a known price table.
//!
//! revenue[year] = round(annual_credits x operating_fraction(year) x price[year])
//! party[year]   = round(annual_credits x operating_fraction(year) x price[year] x pct / 100)
//!
//! The sparse maps contain exactly the priced years in which the system
//! operates. Years before commissioning are left out.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::proration::{floor_commission_date, operating_fraction};
use crate::config::EngineConfig;
use crate::energy::YieldModel;
use crate::pricing::PriceTable;
use crate::shares::ShareSplit;
use crate::types::{round_currency, saturating_sum, Kwh, Money, Percent, Tonnes, YearlyAmounts};

const ONE_HUNDRED: Decimal = dec!(100);

/// One row of the dense yearly schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: i32,
    /// Fraction of the year the system operates (0-1].
    pub operating_fraction: Decimal,
    pub energy_kwh: Kwh,
    pub carbon_credits: Tonnes,
    /// `None` when no price is configured for the year.
    pub price: Option<Money>,
    pub revenue: Option<Money>,
}

/// Per-party amounts for one priced year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyRevenueSplit {
    pub year: i32,
    pub total: Money,
    pub client: Money,
    pub agent: Money,
    pub platform: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueProjector {
    pub model: YieldModel,
    /// Commissioning dates before Jan 1 of this year are floored to it.
    pub floor_year: i32,
    /// The dense schedule runs at least through this year.
    pub horizon_end_year: i32,
}

impl Default for RevenueProjector {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl RevenueProjector {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            model: YieldModel::from(config),
            floor_year: config.projection_floor_year,
            horizon_end_year: config.horizon_end_year,
        }
    }

    /// Commissioning date after applying the projection floor.
    pub fn effective_commission_date(&self, date: Option<NaiveDate>) -> Option<NaiveDate> {
        date.map(|d| floor_commission_date(d, self.floor_year))
    }

    /// Unrounded credits x price for every operating priced year.
    ///
    /// Negative prices and products outside the Decimal range are skipped.
    fn gross_by_year(
        &self,
        size_kwp: Decimal,
        commission_date: Option<NaiveDate>,
        prices: &PriceTable,
    ) -> Vec<(i32, Decimal)> {
        let annual_credits = self.model.carbon_credits(size_kwp);
        let commission_date = self.effective_commission_date(commission_date);
        prices
            .iter()
            .filter_map(|(&year, &price)| {
                if price.is_sign_negative() {
                    warn!(year, %price, "skipping negative carbon price");
                    return None;
                }
                let fraction = operating_fraction(commission_date, year);
                if fraction.is_zero() {
                    return None;
                }
                match (annual_credits * fraction).checked_mul(price) {
                    Some(gross) => Some((year, gross)),
                    None => {
                        warn!(year, %price, "carbon revenue out of range, skipping year");
                        None
                    }
                }
            })
            .collect()
    }

    /// Total carbon revenue per priced year, rounded to whole units.
    ///
    /// Priced years before the commissioning year are left out rather than
    /// charged full-year credits, since the system does not operate yet.
    pub fn revenue(
        &self,
        size_kwp: Decimal,
        commission_date: Option<NaiveDate>,
        prices: &PriceTable,
    ) -> YearlyAmounts {
        self.gross_by_year(size_kwp, commission_date, prices)
            .into_iter()
            .map(|(year, gross)| (year, round_currency(gross)))
            .collect()
    }

    /// Revenue attributable to a percentage share (agent, platform, client).
    pub fn commission_revenue(
        &self,
        size_kwp: Decimal,
        commission_date: Option<NaiveDate>,
        prices: &PriceTable,
        percentage: Percent,
    ) -> YearlyAmounts {
        self.gross_by_year(size_kwp, commission_date, prices)
            .into_iter()
            .map(|(year, gross)| (year, round_currency(share(gross, percentage))))
            .collect()
    }

    /// Total and per-party revenue per priced year. Each amount is rounded
    /// on its own, so the parts may differ from the total by a unit.
    pub fn revenue_split(
        &self,
        size_kwp: Decimal,
        commission_date: Option<NaiveDate>,
        prices: &PriceTable,
        split: &ShareSplit,
    ) -> Vec<YearlyRevenueSplit> {
        let part = |gross: Decimal, pct: Percent| round_currency(share(gross, pct));
        self.gross_by_year(size_kwp, commission_date, prices)
            .into_iter()
            .map(|(year, gross)| YearlyRevenueSplit {
                year,
                total: round_currency(gross),
                client: part(gross, split.client_share_percentage),
                agent: part(gross, split.agent_commission_percentage),
                platform: part(gross, split.platform_percentage),
            })
            .collect()
    }

    /// Dense schedule from the first operating year through
    /// `max(horizon_end_year, last priced year)`.
    pub fn schedule(
        &self,
        size_kwp: Decimal,
        commission_date: Option<NaiveDate>,
        prices: &PriceTable,
    ) -> Vec<YearlyProjection> {
        let commission_date = self.effective_commission_date(commission_date);
        let mut start = commission_date.map_or(self.floor_year, |d| d.year());
        if let Some(&first_priced) = prices.keys().next() {
            start = start.max(first_priced);
        }
        let end = prices
            .keys()
            .next_back()
            .map_or(self.horizon_end_year, |&last| last.max(self.horizon_end_year));

        let annual_energy = self.model.annual_energy(size_kwp);
        let annual_credits = self.model.carbon_credits(size_kwp);

        (start..=end)
            .map(|year| {
                let fraction = operating_fraction(commission_date, year);
                let credits = annual_credits * fraction;
                let price = prices.get(&year).copied().filter(|p| !p.is_sign_negative());
                YearlyProjection {
                    year,
                    operating_fraction: fraction,
                    energy_kwh: annual_energy * fraction,
                    carbon_credits: credits,
                    price,
                    revenue: price.and_then(|p| credits.checked_mul(p)).map(round_currency),
                }
            })
            .collect()
    }
}

/// `pct` percent of `gross`. Dividing first keeps the product in range.
fn share(gross: Decimal, pct: Percent) -> Decimal {
    gross / ONE_HUNDRED * pct
}

/// Sum of a yearly amount map.
pub fn total(amounts: &YearlyAmounts) -> Money {
    saturating_sum(amounts.values().copied())
}
