use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::cache::{PriceCache, TtlPriceCache};
use super::clock::{Clock, SystemClock};
use super::source::CarbonPriceSource;
use super::{current_and_future, PriceTable};
use crate::config::EngineConfig;
use crate::types::Money;
use crate::CarbonResult;

/// Cached, current-year-and-later view of the configured carbon prices.
///
/// Never invents prices: when nothing is configured, or the fetch fails, the
/// table is empty and every revenue figure derived from it is absent.
pub struct DynamicPriceSource {
    source: Arc<dyn CarbonPriceSource>,
    cache: Arc<dyn PriceCache>,
    clock: Arc<dyn Clock>,
}

impl DynamicPriceSource {
    pub fn new(
        source: Arc<dyn CarbonPriceSource>,
        cache: Arc<dyn PriceCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            cache,
            clock,
        }
    }

    /// Source backed by a [`TtlPriceCache`] on the given clock.
    pub fn with_ttl(
        source: Arc<dyn CarbonPriceSource>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(TtlPriceCache::new(ttl, clock.clone()));
        Self::new(source, cache, clock)
    }

    /// Wall-clock source using the configured cache window.
    pub fn from_config(source: Arc<dyn CarbonPriceSource>, config: &EngineConfig) -> Self {
        Self::with_ttl(source, config.cache_ttl(), Arc::new(SystemClock))
    }

    pub fn current_year(&self) -> i32 {
        self.clock.current_year()
    }

    /// Current and future prices, distinguishing a failed fetch from an
    /// empty configuration. Failures are not cached.
    pub async fn try_prices(&self) -> CarbonResult<PriceTable> {
        let current_year = self.current_year();
        if let Some(mut cached) = self.cache.get() {
            debug!(years = cached.len(), "carbon price cache hit");
            // The cache may straddle New Year.
            cached.retain(|year, _| *year >= current_year);
            return Ok(cached);
        }

        debug!("carbon price cache miss, fetching");
        let raw = self.source.carbon_prices().await?;
        let table = current_and_future(&raw, current_year);
        if table.is_empty() {
            warn!(current_year, "no current or future carbon prices configured");
        } else {
            info!(
                years = table.len(),
                first = table.keys().next().copied().unwrap_or(current_year),
                "cached carbon prices"
            );
        }
        self.cache.set(table.clone());
        Ok(table)
    }

    /// Current and future prices; a failed fetch degrades to (and caches) an
    /// empty table.
    pub async fn prices(&self) -> PriceTable {
        match self.try_prices().await {
            Ok(table) => table,
            Err(e) => {
                error!(error = %e, "failed to fetch carbon prices, using empty price table");
                self.cache.set(PriceTable::new());
                PriceTable::new()
            }
        }
    }

    /// Price for one year; zero for past years and unpriced years.
    pub async fn price_for_year(&self, year: i32) -> Money {
        if year < self.current_year() {
            return Decimal::ZERO;
        }
        self.prices()
            .await
            .get(&year)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Drop the cached table so the next call refetches.
    pub fn invalidate(&self) {
        debug!("carbon price cache invalidated");
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CarbonError;
    use crate::pricing::clock::FixedClock;
    use crate::pricing::RawPriceTable;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches and fails on demand.
    struct CountingSource {
        prices: RawPriceTable,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(prices: RawPriceTable) -> Self {
            Self {
                prices,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                prices: RawPriceTable::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CarbonPriceSource for CountingSource {
        async fn carbon_prices(&self) -> CarbonResult<RawPriceTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CarbonError::PriceFetch("settings store unreachable".into()));
            }
            Ok(self.prices.clone())
        }
    }

    fn raw_prices() -> RawPriceTable {
        RawPriceTable::from([
            ("2024".to_string(), dec!(61.00)),
            ("2025".to_string(), dec!(78.36)),
            ("2026".to_string(), dec!(93.19)),
        ])
    }

    fn setup(source: Arc<CountingSource>) -> (Arc<FixedClock>, DynamicPriceSource) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap(),
        ));
        let provider =
            DynamicPriceSource::with_ttl(source, Duration::from_secs(300), clock.clone());
        (clock, provider)
    }

    #[tokio::test]
    async fn test_filters_past_years() {
        let source = Arc::new(CountingSource::new(raw_prices()));
        let (_, provider) = setup(source);
        let prices = provider.prices().await;
        assert_eq!(
            prices,
            PriceTable::from([(2025, dec!(78.36)), (2026, dec!(93.19))])
        );
    }

    #[tokio::test]
    async fn test_cache_hit_within_window() {
        let source = Arc::new(CountingSource::new(raw_prices()));
        let (clock, provider) = setup(source.clone());
        provider.prices().await;
        clock.advance(chrono::Duration::seconds(120));
        provider.prices().await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_refetch_after_window() {
        let source = Arc::new(CountingSource::new(raw_prices()));
        let (clock, provider) = setup(source.clone());
        provider.prices().await;
        clock.advance(chrono::Duration::seconds(300));
        provider.prices().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let source = Arc::new(CountingSource::failing());
        let (_, provider) = setup(source.clone());
        assert!(provider.prices().await.is_empty());
        // The empty fallback is cached for the window.
        assert!(provider.prices().await.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_try_prices_surfaces_failure() {
        let source = Arc::new(CountingSource::failing());
        let (_, provider) = setup(source);
        let err = provider.try_prices().await.unwrap_err();
        assert!(matches!(err, CarbonError::PriceFetch(_)));
    }

    #[tokio::test]
    async fn test_try_prices_empty_configuration_is_ok() {
        let source = Arc::new(CountingSource::new(RawPriceTable::new()));
        let (_, provider) = setup(source);
        assert_eq!(provider.try_prices().await.unwrap(), PriceTable::new());
    }

    #[tokio::test]
    async fn test_price_for_past_year_skips_fetch() {
        let source = Arc::new(CountingSource::new(raw_prices()));
        let (_, provider) = setup(source.clone());
        assert_eq!(provider.price_for_year(2024).await, Decimal::ZERO);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_price_for_year_lookup() {
        let source = Arc::new(CountingSource::new(raw_prices()));
        let (_, provider) = setup(source);
        assert_eq!(provider.price_for_year(2026).await, dec!(93.19));
        assert_eq!(provider.price_for_year(2031).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = Arc::new(CountingSource::new(raw_prices()));
        let (_, provider) = setup(source.clone());
        provider.prices().await;
        provider.invalidate();
        provider.prices().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_cached_table_rolls_over_new_year() {
        let source = Arc::new(CountingSource::new(raw_prices()));
        let (clock, provider) = setup(source.clone());
        clock.set(Utc.with_ymd_and_hms(2025, 12, 31, 23, 58, 0).unwrap());
        provider.prices().await;
        clock.advance(chrono::Duration::minutes(3));
        let prices = provider.prices().await;
        assert_eq!(source.calls(), 1);
        assert_eq!(prices, PriceTable::from([(2026, dec!(93.19))]));
    }
}
