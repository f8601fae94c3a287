use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use forecast_core::{PriceSeries, ProviderError, ProviderKind};
use tokio::sync::Mutex;

/// Cache key: one entry per (provider, ticker) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: ProviderKind,
    pub ticker: String,
}

impl CacheKey {
    pub fn new(provider: ProviderKind, ticker: &str) -> Self {
        Self {
            provider,
            ticker: ticker.trim().to_uppercase(),
        }
    }
}

struct CacheEntry {
    series: PriceSeries,
    fetched_at: DateTime<Utc>,
}

/// TTL cache over normalized price series with per-key single-flight.
///
/// Concurrent misses for the same key coalesce into one fetch: the first
/// caller through the per-key lock performs it, everyone else re-checks
/// the entry map after the lock and reuses the result. A failed or empty
/// fetch caches an empty series for a full TTL window, so an erroring
/// provider produces repeated "no data" results instead of a retry storm.
pub struct SeriesCache {
    ttl: TimeDelta,
    entries: DashMap<CacheKey, CacheEntry>,
    inflight: DashMap<CacheKey, Arc<Mutex<()>>>,
}

/// One hour, matching the refresh interval the app has always used.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            entries: DashMap::new(),
            inflight: DashMap::new(),
        }
    }

    /// Return the cached series for (provider, ticker), fetching it with
    /// `fetch` if the entry is absent or older than the TTL.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        provider: ProviderKind,
        ticker: &str,
        fetch: F,
    ) -> PriceSeries
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PriceSeries, ProviderError>>,
    {
        let key = CacheKey::new(provider, ticker);

        if let Some(series) = self.fresh(&key) {
            tracing::debug!("cache hit for {}:{}", provider.display_name(), key.ticker);
            return series;
        }

        let lock = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // The winner of the race may have refilled the entry while this
        // task waited on the lock.
        if let Some(series) = self.fresh(&key) {
            return series;
        }

        let series = match fetch().await {
            Ok(series) => {
                tracing::info!(
                    "fetched {} records for {}:{}",
                    series.len(),
                    provider.display_name(),
                    key.ticker
                );
                series
            }
            Err(e) => {
                tracing::warn!(
                    "fetch failed for {}:{}, caching empty series: {}",
                    provider.display_name(),
                    key.ticker,
                    e
                );
                PriceSeries::empty(&key.ticker, provider)
            }
        };

        // Replace-whole-entry semantics: never patch an existing entry.
        self.entries.insert(
            key,
            CacheEntry {
                series: series.clone(),
                fetched_at: Utc::now(),
            },
        );

        series
    }

    /// Drop the entry for one key, forcing the next call to fetch.
    pub fn invalidate(&self, provider: ProviderKind, ticker: &str) {
        self.entries.remove(&CacheKey::new(provider, ticker));
    }

    fn fresh(&self, key: &CacheKey) -> Option<PriceSeries> {
        let entry = self.entries.get(key)?;
        let age = Utc::now() - entry.fetched_at;
        (age <= self.ttl).then(|| entry.series.clone())
    }
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
