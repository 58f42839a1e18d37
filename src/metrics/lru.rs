//! LRU Cache Metrics
//!
//! Metrics reported by [`LruCache`](crate::LruCache).

extern crate alloc;

use super::CoreCacheMetrics;
use alloc::collections::BTreeMap;
use alloc::string::String;

/// LRU-specific metrics (extends CoreCacheMetrics).
///
/// LRU has no algorithm-specific state worth reporting beyond the core
/// counters; the wrapper exists so the cache reports under its own name.
#[derive(Debug, Clone)]
pub struct LruCacheMetrics {
    /// Core metrics common to all caches
    pub core: CoreCacheMetrics,
}

impl LruCacheMetrics {
    /// Creates metrics for a cache bounded by `max_cache_size_bytes`.
    pub fn new(max_cache_size_bytes: u64) -> Self {
        Self {
            core: CoreCacheMetrics::new(max_cache_size_bytes),
        }
    }

    /// Converts LRU metrics to a BTreeMap for reporting.
    pub fn to_btreemap(&self, cache_size_bytes: u64) -> BTreeMap<String, f64> {
        self.core.to_btreemap(cache_size_bytes)
    }

    /// Reporter name used by [`CacheMetrics::algorithm_name`](super::CacheMetrics::algorithm_name).
    pub fn algorithm_name(&self) -> &'static str {
        "LRU"
    }
}
