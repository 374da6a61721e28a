use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::clock::Clock;
use super::PriceTable;

/// Storage for the most recently fetched price table.
pub trait PriceCache: Send + Sync {
    /// The cached table, if one is stored and still fresh.
    fn get(&self) -> Option<PriceTable>;

    fn set(&self, table: PriceTable);

    fn invalidate(&self);
}

#[derive(Debug, Clone)]
struct CachedPrices {
    table: PriceTable,
    fetched_at: DateTime<Utc>,
}

/// Single-slot cache whose entry expires `ttl` after it was stored.
///
/// Concurrent misses may each fetch; the last `set` wins.
pub struct TtlPriceCache {
    entry: Mutex<Option<CachedPrices>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlPriceCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl,
            clock,
        }
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>) -> bool {
        let age = self.clock.now() - fetched_at;
        match age.to_std() {
            Ok(age) => age < self.ttl,
            // Stored "in the future" after a clock step backwards; treat as fresh.
            Err(_) => true,
        }
    }
}

impl PriceCache for TtlPriceCache {
    fn get(&self) -> Option<PriceTable> {
        let entry = self.entry.lock();
        entry
            .as_ref()
            .filter(|cached| self.is_fresh(cached.fetched_at))
            .map(|cached| cached.table.clone())
    }

    fn set(&self, table: PriceTable) {
        *self.entry.lock() = Some(CachedPrices {
            table,
            fetched_at: self.clock.now(),
        });
    }

    fn invalidate(&self) {
        *self.entry.lock() = None;
    }
}
