use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use solar_carbon_core::config::EngineConfig;
use solar_carbon_core::pricing::{
    CarbonPriceSource, DynamicPriceSource, FixedClock, PriceTable, RawPriceTable,
};
use solar_carbon_core::proposal::{project_proposal, ProposalInput};
use solar_carbon_core::revenue::{RevenueCalculator, RevenueProjector};
use solar_carbon_core::units::SystemSize;
use solar_carbon_core::{CarbonError, CarbonResult};

/// Settings store double whose availability can be toggled.
struct FlakySource {
    prices: RawPriceTable,
    down: AtomicBool,
    calls: AtomicUsize,
}

impl FlakySource {
    fn new() -> Self {
        Self {
            prices: RawPriceTable::from([
                ("2025".to_string(), dec!(78.36)),
                ("2026".to_string(), dec!(93.19)),
            ]),
            down: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CarbonPriceSource for FlakySource {
    async fn carbon_prices(&self) -> CarbonResult<RawPriceTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(CarbonError::PriceFetch("connection refused".into()));
        }
        Ok(self.prices.clone())
    }
}

fn setup(source: Arc<FlakySource>) -> (Arc<FixedClock>, Arc<DynamicPriceSource>) {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 5, 20, 8, 30, 0).unwrap(),
    ));
    let prices = DynamicPriceSource::with_ttl(source, Duration::from_secs(300), clock.clone());
    (clock, Arc::new(prices))
}

// ===========================================================================
// Dynamic price source
// ===========================================================================

#[tokio::test]
async fn test_fetch_failure_returns_empty() {
    let source = Arc::new(FlakySource::new());
    source.down.store(true, Ordering::SeqCst);
    let (_, prices) = setup(source);
    assert_eq!(prices.prices().await, PriceTable::new());
}

#[tokio::test]
async fn test_stale_cache_not_served_past_window() {
    let source = Arc::new(FlakySource::new());
    let (clock, prices) = setup(source.clone());

    assert_eq!(prices.prices().await.len(), 2);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    // Store goes down; the fresh cache still answers.
    source.down.store(true, Ordering::SeqCst);
    clock.advance(chrono::Duration::seconds(299));
    assert_eq!(prices.prices().await.len(), 2);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    // Past the window the old table is not reused: a refetch happens and fails.
    clock.advance(chrono::Duration::seconds(1));
    assert_eq!(prices.prices().await, PriceTable::new());
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_recovers_after_empty_fallback_expires() {
    let source = Arc::new(FlakySource::new());
    source.down.store(true, Ordering::SeqCst);
    let (clock, prices) = setup(source.clone());
    assert!(prices.prices().await.is_empty());

    source.down.store(false, Ordering::SeqCst);
    clock.advance(chrono::Duration::minutes(5));
    assert_eq!(prices.prices().await.len(), 2);
}

// ===========================================================================
// Revenue through the live source
// ===========================================================================

#[tokio::test]
async fn test_failed_fetch_yields_no_revenue() {
    let source = Arc::new(FlakySource::new());
    source.down.store(true, Ordering::SeqCst);
    let (_, prices) = setup(source);
    let calc = RevenueCalculator::new(prices, RevenueProjector::default());
    let revenue = calc.revenue(&SystemSize::from("250 kWp"), None, None).await;
    assert!(revenue.is_empty());
}

#[tokio::test]
async fn test_proposal_with_live_prices() {
    let source = Arc::new(FlakySource::new());
    let (_, prices) = setup(source);
    let input = ProposalInput {
        system_size: SystemSize::Number(dec!(100)),
        unit: None,
        commission_date: None,
        existing_systems: vec![],
        portfolio_kwp: None,
    };
    let out = project_proposal(&input, &prices, &EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(out.result.total_revenue, dec!(29107));
    assert_eq!(out.result.platform_percentage, dec!(33));
    assert!(out.result.agent_revenue > Decimal::ZERO);
}
