//! Cache Metrics System
//!
//! Provides BTreeMap-based metrics reporting for the eviction cache and for
//! cache groups. Every reporter implements the common [`CacheMetrics`] trait.
//!
//! # Why BTreeMap over HashMap?
//!
//! - **Deterministic ordering**: Metrics always appear in consistent order
//! - **Reproducible output**: Simulator runs and tests compare cleanly
//! - **Stable serialization**: CSV exports have predictable column ordering
//!
//! The O(log n) lookup is irrelevant at ~15 keys.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

pub mod group;
pub mod lru;

pub use group::GroupStats;
pub use lru::LruCacheMetrics;

/// Counters shared by every byte-bounded cache.
#[derive(Debug, Default, Clone)]
pub struct CoreCacheMetrics {
    /// Total number of lookups made against the cache
    pub requests: u64,

    /// Number of lookups that found their key
    pub cache_hits: u64,

    /// Number of new entries written into the cache
    pub insertions: u64,

    /// Number of in-place value replacements
    pub updates: u64,

    /// Total bytes written into the cache (inserts and updates)
    pub bytes_written_to_cache: u64,

    /// Total bytes returned from cache hits
    pub bytes_served_from_cache: u64,

    /// Number of entries evicted to honour the byte budget
    pub evictions: u64,

    /// Maximum allowed accounted bytes (`0` = unbounded)
    pub max_cache_size_bytes: u64,
}

impl CoreCacheMetrics {
    /// Creates counters for a cache bounded by `max_cache_size_bytes`.
    pub fn new(max_cache_size_bytes: u64) -> Self {
        Self {
            max_cache_size_bytes,
            ..Default::default()
        }
    }

    /// Records a lookup that found its key.
    pub fn record_hit(&mut self, object_size: u64) {
        self.requests += 1;
        self.cache_hits += 1;
        self.bytes_served_from_cache += object_size;
    }

    /// Records a lookup that did not find its key.
    ///
    /// Misses are derived as `requests - cache_hits`.
    pub fn record_miss(&mut self) {
        self.requests += 1;
    }

    /// Records a brand new entry of `object_size` accounted bytes.
    pub fn record_insertion(&mut self, object_size: u64) {
        self.insertions += 1;
        self.bytes_written_to_cache += object_size;
    }

    /// Records an in-place replacement with a value of `object_size` bytes.
    pub fn record_update(&mut self, object_size: u64) {
        self.updates += 1;
        self.bytes_written_to_cache += object_size;
    }

    /// Records one eviction.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Fraction of lookups that hit, `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Fraction of lookups that missed, `0.0` before the first lookup.
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            (self.requests - self.cache_hits) as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Convert core metrics to a BTreeMap for reporting.
    ///
    /// `cache_size_bytes` is the live accounted size, which the cache owns and
    /// passes in rather than mirroring it here.
    pub fn to_btreemap(&self, cache_size_bytes: u64) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert(
            "cache_misses".to_string(),
            (self.requests - self.cache_hits) as f64,
        );
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("requests".to_string(), self.requests as f64);
        metrics.insert("updates".to_string(), self.updates as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        metrics.insert(
            "bytes_served_from_cache".to_string(),
            self.bytes_served_from_cache as f64,
        );
        metrics.insert(
            "bytes_written_to_cache".to_string(),
            self.bytes_written_to_cache as f64,
        );

        metrics.insert("cache_size_bytes".to_string(), cache_size_bytes as f64);
        metrics.insert(
            "max_cache_size_bytes".to_string(),
            self.max_cache_size_bytes as f64,
        );
        if self.max_cache_size_bytes > 0 {
            metrics.insert(
                "cache_utilization".to_string(),
                cache_size_bytes as f64 / self.max_cache_size_bytes as f64,
            );
        }

        metrics
    }
}

/// Trait implemented by everything that reports metrics.
///
/// The returned map is keyed alphabetically so that output is stable across
/// runs, which the simulator relies on for CSV export.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short identifier of the reporter (e.g. `"LRU"`, `"Group"`).
    fn algorithm_name(&self) -> &'static str;
}
