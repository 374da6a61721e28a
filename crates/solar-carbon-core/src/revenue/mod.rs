//! Carbon revenue projection.
//!
//! [`RevenueProjector`] does the arithmetic against an explicit price table.
//! [`RevenueCalculator`] pairs it with a [`DynamicPriceSource`] and accepts raw
//! size input, which is what request handlers call.

pub mod projection;
pub mod proration;

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::pricing::DynamicPriceSource;
use crate::shares::{Party, ShareSplit};
use crate::types::{Percent, YearlyAmounts};
use crate::units::{normalize_size, CapacityUnit, SystemSize};

pub use projection::{RevenueProjector, YearlyProjection, YearlyRevenueSplit};
pub use proration::{operating_fraction, parse_commission_date};

pub struct RevenueCalculator {
    prices: Arc<DynamicPriceSource>,
    projector: RevenueProjector,
}

impl RevenueCalculator {
    pub fn new(prices: Arc<DynamicPriceSource>, projector: RevenueProjector) -> Self {
        Self { prices, projector }
    }

    pub fn from_config(prices: Arc<DynamicPriceSource>, config: &EngineConfig) -> Self {
        Self::new(prices, RevenueProjector::from_config(config))
    }

    pub fn projector(&self) -> &RevenueProjector {
        &self.projector
    }

    /// Total carbon revenue per priced year.
    pub async fn revenue(
        &self,
        size: &SystemSize,
        commission_date: Option<NaiveDate>,
        unit: Option<CapacityUnit>,
    ) -> YearlyAmounts {
        let size_kwp = normalize_size(size, unit);
        let prices = self.prices.prices().await;
        self.projector.revenue(size_kwp, commission_date, &prices)
    }

    /// Revenue for an explicit percentage share.
    pub async fn commission_revenue(
        &self,
        size: &SystemSize,
        commission_date: Option<NaiveDate>,
        unit: Option<CapacityUnit>,
        percentage: Percent,
    ) -> YearlyAmounts {
        let size_kwp = normalize_size(size, unit);
        let prices = self.prices.prices().await;
        self.projector
            .commission_revenue(size_kwp, commission_date, &prices, percentage)
    }

    /// Revenue for one party, with its percentage resolved from the portfolio
    /// tiers. The portfolio defaults to this system alone.
    pub async fn party_revenue(
        &self,
        size: &SystemSize,
        commission_date: Option<NaiveDate>,
        unit: Option<CapacityUnit>,
        party: Party,
        portfolio_kwp: Option<Decimal>,
    ) -> YearlyAmounts {
        let size_kwp = normalize_size(size, unit);
        let split = ShareSplit::for_portfolio(portfolio_kwp.unwrap_or(size_kwp));
        self.commission_revenue(size, commission_date, unit, split.percentage(party))
            .await
    }

    /// Referring agent's commission per priced year.
    pub async fn agent_commission_revenue(
        &self,
        size: &SystemSize,
        commission_date: Option<NaiveDate>,
        unit: Option<CapacityUnit>,
    ) -> YearlyAmounts {
        self.party_revenue(size, commission_date, unit, Party::Agent, None)
            .await
    }

    /// Platform operator's remainder per priced year.
    pub async fn platform_commission_revenue(
        &self,
        size: &SystemSize,
        commission_date: Option<NaiveDate>,
        unit: Option<CapacityUnit>,
    ) -> YearlyAmounts {
        self.party_revenue(size, commission_date, unit, Party::Platform, None)
            .await
    }

    pub async fn schedule(
        &self,
        size: &SystemSize,
        commission_date: Option<NaiveDate>,
        unit: Option<CapacityUnit>,
    ) -> Vec<YearlyProjection> {
        let size_kwp = normalize_size(size, unit);
        let prices = self.prices.prices().await;
        self.projector.schedule(size_kwp, commission_date, &prices)
    }
}
