//! Group Metrics
//!
//! Per-group counters updated concurrently by every caller of `Group::get`.
//! All counters are relaxed atomics: they are telemetry, never used to make
//! a correctness decision.

extern crate alloc;

use super::CacheMetrics;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::sync::atomic::{AtomicU64, Ordering};

/// Live counters of a cache group.
#[derive(Debug, Default)]
pub struct GroupStats {
    /// Every call to `get`, including empty-key rejections.
    pub gets: AtomicU64,
    /// Calls served straight from the main cache.
    pub cache_hits: AtomicU64,
    /// Misses that went through the coalescer (`loads - loads_deduped` fetches ran).
    pub loads: AtomicU64,
    /// Loads that were answered by a call another caller already had in flight.
    pub loads_deduped: AtomicU64,
    /// Successful fetches from a remote owner.
    pub peer_loads: AtomicU64,
    /// Failed fetches from a remote owner (each one fell back to the loader).
    pub peer_errors: AtomicU64,
    /// Successful loader invocations.
    pub local_loads: AtomicU64,
    /// Failed loader invocations.
    pub local_load_errs: AtomicU64,
    /// Entries evicted from the main cache.
    pub evictions: AtomicU64,
}

impl GroupStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a plain-value copy of every counter.
    pub fn snapshot(&self) -> GroupStatsSnapshot {
        GroupStatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            loads_deduped: self.loads_deduped.load(Ordering::Relaxed),
            peer_loads: self.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
            local_loads: self.local_loads.load(Ordering::Relaxed),
            local_load_errs: self.local_load_errs.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`GroupStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroupStatsSnapshot {
    /// See [`GroupStats::gets`].
    pub gets: u64,
    /// See [`GroupStats::cache_hits`].
    pub cache_hits: u64,
    /// See [`GroupStats::loads`].
    pub loads: u64,
    /// See [`GroupStats::loads_deduped`].
    pub loads_deduped: u64,
    /// See [`GroupStats::peer_loads`].
    pub peer_loads: u64,
    /// See [`GroupStats::peer_errors`].
    pub peer_errors: u64,
    /// See [`GroupStats::local_loads`].
    pub local_loads: u64,
    /// See [`GroupStats::local_load_errs`].
    pub local_load_errs: u64,
    /// See [`GroupStats::evictions`].
    pub evictions: u64,
}

impl GroupStatsSnapshot {
    /// Fraction of gets answered by the main cache.
    pub fn hit_rate(&self) -> f64 {
        if self.gets > 0 {
            self.cache_hits as f64 / self.gets as f64
        } else {
            0.0
        }
    }

    /// Converts the snapshot to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("gets".to_string(), self.gets as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("loads".to_string(), self.loads as f64);
        metrics.insert("loads_deduped".to_string(), self.loads_deduped as f64);
        metrics.insert("local_load_errs".to_string(), self.local_load_errs as f64);
        metrics.insert("local_loads".to_string(), self.local_loads as f64);
        metrics.insert("peer_errors".to_string(), self.peer_errors as f64);
        metrics.insert("peer_loads".to_string(), self.peer_loads as f64);
        metrics
    }
}

impl CacheMetrics for GroupStats {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.snapshot().to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "Group"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = GroupStats::new();
        GroupStats::incr(&stats.gets);
        GroupStats::incr(&stats.gets);
        GroupStats::incr(&stats.cache_hits);
        GroupStats::incr(&stats.peer_errors);
        let snap = stats.snapshot();
        assert_eq!(snap.gets, 2);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.peer_errors, 1);
        assert_eq!(snap.hit_rate(), 0.5);
        assert_eq!(stats.metrics().get("gets"), Some(&2.0));
        assert_eq!(stats.algorithm_name(), "Group");
    }
}
