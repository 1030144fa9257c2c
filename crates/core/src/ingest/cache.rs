use crate::domain::market::PriceSeries;
use crate::error::RiskError;
use crate::ingest::provider::PriceHistoryProvider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

type Slot = Arc<tokio::sync::Mutex<Option<CachedSeries>>>;

/// Wraps a provider with a per-window cache that expires after a fixed TTL.
///
/// Each window has its own slot: concurrent callers for one window wait on a single fetch, while
/// other windows proceed independently. Failures are never cached.
pub struct CachedHistoryProvider<P> {
    inner: P,
    ttl: Duration,
    slots: tokio::sync::Mutex<HashMap<usize, Slot>>,
}

#[derive(Debug, Clone)]
struct CachedSeries {
    series: PriceSeries,
    fetched_at: Instant,
}

impl CachedSeries {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() >= ttl
    }
}

impl<P: PriceHistoryProvider> CachedHistoryProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slots: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drops every cached window so the next fetch goes to the source.
    pub async fn invalidate(&self) {
        self.slots.lock().await.clear();
    }

    /// Evicts idle expired slots and returns the slot for `window`. The map lock is only held here.
    async fn slot(&self, window: usize) -> Slot {
        let ttl = self.ttl;
        let mut slots = self.slots.lock().await;

        // A slot locked by an in-flight fetch is kept.
        slots.retain(|_, slot| match slot.try_lock() {
            Ok(cached) => cached.as_ref().is_some_and(|c| !c.is_expired(ttl)),
            Err(_) => true,
        });

        Arc::clone(slots.entry(window).or_default())
    }
}

#[async_trait::async_trait]
impl<P: PriceHistoryProvider> PriceHistoryProvider for CachedHistoryProvider<P> {
    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    async fn fetch_history(&self, window: usize) -> Result<PriceSeries, RiskError> {
        let slot = self.slot(window).await;
        let mut cached = slot.lock().await;

        if let Some(hit) = cached.as_ref().filter(|c| !c.is_expired(self.ttl)) {
            tracing::debug!(window, age_ms = hit.fetched_at.elapsed().as_millis(), "price cache hit");
            return Ok(hit.series.clone());
        }

        *cached = None;
        let series = self.inner.fetch_history(window).await?;
        *cached = Some(CachedSeries {
            series: series.clone(),
            fetched_at: Instant::now(),
        });
        Ok(series)
    }
}
