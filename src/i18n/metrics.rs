//! Translation cache metrics.
//!
//! Each manager owns one `CacheMetrics`, so counters are scoped to the
//! request (or process) the manager serves.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for cache activity, store round-trips and fallback usage.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Number of lookups answered from the cache
    cache_hits: AtomicUsize,

    /// Number of lookups that had to go to the store
    cache_misses: AtomicUsize,

    /// Number of queries issued to the store
    store_queries: AtomicUsize,

    /// Number of translations served from the fallback locale
    fallbacks: AtomicUsize,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_query(&self) {
        self.store_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn store_queries(&self) -> usize {
        self.store_queries.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_lookups = hits + misses;
        let cache_hit_rate = if total_lookups > 0 {
            (hits as f64 / total_lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            store_queries: self.store_queries(),
            fallbacks: self.fallbacks(),
        }
    }
}

/// Snapshot of the cache counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub store_queries: usize,
    pub fallbacks: usize,
}
