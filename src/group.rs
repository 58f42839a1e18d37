//! Cache groups: the read-through coordinator.
//!
//! A [`Group`] is one named cache namespace. A lookup flows through it like
//! this:
//!
//! ```text
//!  get(key)
//!    │ empty key ─────────────────────────────────────▶ InvalidArgument
//!    ▼
//!  main cache hit? ── yes ────────────────────────────▶ value
//!    │ no
//!    ▼
//!  coalescer (one fetch per key at a time)
//!    │
//!    ├─ picker names a remote owner ─▶ peer.get ── ok ▶ value (not cached here)
//!    │                                      │ err
//!    │                                      ▼ warn, fall through
//!    └─ loader.load ── ok ─▶ populate main cache ────▶ value
//!                      err ───────────────────────────▶ Loader error
//! ```

extern crate alloc;

use crate::byteview::ByteView;
use crate::coalesce::Coalescer;
use crate::config::GroupConfig;
use crate::error::{BoxError, Error, Result};
use crate::lru::{LruCache, OnEvicted};
use crate::metrics::group::GroupStatsSnapshot;
use crate::metrics::{CacheMetrics, GroupStats};
use crate::peers::{Loader, PeerGetter, PeerPicker};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;
use parking_lot::Mutex;
use std::sync::OnceLock;
use tracing::{debug, trace, warn};

/// A named, byte-bounded, read-through cache namespace.
///
/// Groups are shared behind an `Arc` (see
/// [`GroupRegistry`](crate::GroupRegistry)) and every method takes `&self`.
///
/// # Examples
///
/// ```
/// use peercache::config::GroupConfig;
/// use peercache::{loader_fn, Group};
/// use std::sync::Arc;
///
/// let scores = Group::new(
///     GroupConfig { name: "scores".to_string(), max_bytes: 2 << 10 },
///     Arc::new(loader_fn(|key: &str| match key {
///         "Tom" => Ok(b"630".to_vec()),
///         _ => Err(format!("{key} not exist").into()),
///     })),
/// );
///
/// assert_eq!(scores.get("Tom").unwrap().as_slice(), b"630");
/// assert!(scores.get("Kate").is_err());
/// assert!(scores.get("").unwrap_err().is_invalid_argument());
/// ```
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    main_cache: Mutex<LruCache<String, ByteView>>,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: Coalescer<ByteView, Error>,
    stats: Arc<GroupStats>,
}

impl Group {
    /// Creates a group that loads misses through `loader`.
    ///
    /// Most callers go through [`GroupRegistry::new_group`](crate::GroupRegistry::new_group)
    /// instead, which also makes the group reachable by name.
    pub fn new(config: GroupConfig, loader: Arc<dyn Loader>) -> Self {
        let stats = Arc::new(GroupStats::new());

        let on_evicted: OnEvicted<String, ByteView> = {
            let stats = Arc::clone(&stats);
            let group = config.name.clone();
            Box::new(move |key, value| {
                GroupStats::incr(&stats.evictions);
                trace!(group = %group, key = %key, bytes = value.len(), "evicted");
            })
        };

        Group {
            main_cache: Mutex::new(LruCache::init(config.cache(), Some(on_evicted))),
            name: config.name,
            loader,
            peers: OnceLock::new(),
            flight: Coalescer::new(),
            stats,
        }
    }

    /// The group's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value for `key`, loading and caching it on a miss.
    ///
    /// Concurrent misses for the same key share one fetch: one caller runs
    /// it and the others receive the same value or the same error.
    pub fn get(&self, key: &str) -> Result<ByteView> {
        GroupStats::incr(&self.stats.gets);
        if key.is_empty() {
            return Err(Error::InvalidArgument("key is required"));
        }

        if let Some(value) = self.lookup_cache(key) {
            GroupStats::incr(&self.stats.cache_hits);
            trace!(group = %self.name, key, "cache hit");
            return Ok(value);
        }

        self.load(key)
    }

    /// Installs the picker used to route keys to their owners.
    ///
    /// # Panics
    ///
    /// Panics if a picker was already registered for this group.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            panic!(
                "register_peers called more than once for group {:?}",
                self.name
            );
        }
        debug!(group = %self.name, "peers registered");
    }

    /// Returns `true` once a picker has been registered.
    pub fn has_peers(&self) -> bool {
        self.peers.get().is_some()
    }

    /// Snapshot of the group's counters.
    pub fn stats(&self) -> GroupStatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of entries resident in the main cache.
    pub fn cache_len(&self) -> usize {
        self.main_cache.lock().len()
    }

    /// Accounted bytes resident in the main cache.
    pub fn cache_bytes(&self) -> u64 {
        self.main_cache.lock().used_bytes()
    }

    /// Returns `true` if `key` is resident in the main cache. Does not count
    /// as an access.
    pub fn is_cached(&self, key: &str) -> bool {
        self.main_cache.lock().contains(key)
    }

    /// Metrics of the main cache alone.
    pub fn cache_metrics(&self) -> BTreeMap<String, f64> {
        self.main_cache.lock().metrics()
    }

    fn lookup_cache(&self, key: &str) -> Option<ByteView> {
        self.main_cache.lock().get(key).cloned()
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.main_cache.lock().put(key.to_string(), value);
    }

    fn load(&self, key: &str) -> Result<ByteView> {
        GroupStats::incr(&self.stats.loads);

        let mut executed = false;
        let result = self.flight.do_call(key, || {
            executed = true;
            self.fetch(key)
        });
        if !executed {
            GroupStats::incr(&self.stats.loads_deduped);
        }
        result
    }

    fn fetch(&self, key: &str) -> Result<ByteView> {
        // A fetch that finished between our miss and claiming the key has
        // already populated the cache. The caller's miss was already counted.
        if let Some(value) = self.main_cache.lock().peek(key).cloned() {
            return Ok(value);
        }

        if let Some(peer) = self.peers.get().and_then(|picker| picker.pick_peer(key)) {
            match self.get_from_peer(peer.as_ref(), key) {
                Ok(value) => {
                    GroupStats::incr(&self.stats.peer_loads);
                    return Ok(value);
                }
                Err(err) => {
                    GroupStats::incr(&self.stats.peer_errors);
                    warn!(
                        group = %self.name,
                        key,
                        error = %err,
                        "peer fetch failed, loading locally"
                    );
                }
            }
        }

        self.get_locally(key)
    }

    fn get_from_peer(
        &self,
        peer: &dyn PeerGetter,
        key: &str,
    ) -> core::result::Result<ByteView, BoxError> {
        let bytes = peer.get(&self.name, key)?;
        Ok(ByteView::from(bytes))
    }

    fn get_locally(&self, key: &str) -> Result<ByteView> {
        match self.loader.load(key) {
            Ok(bytes) => {
                GroupStats::incr(&self.stats.local_loads);
                let value = ByteView::from(bytes);
                debug!(group = %self.name, key, bytes = value.len(), "loaded locally");
                self.populate_cache(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                GroupStats::incr(&self.stats.local_load_errs);
                debug!(group = %self.name, key, error = %err, "load failed");
                Err(Error::loader(err))
            }
        }
    }
}

impl CacheMetrics for Group {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.stats.metrics();
        let cache = self.main_cache.lock();
        metrics.insert("cache_bytes".to_string(), cache.used_bytes() as f64);
        metrics.insert("cache_entries".to_string(), cache.len() as f64);
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        self.stats.algorithm_name()
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("cache", &*self.main_cache.lock())
            .field("has_peers", &self.has_peers())
            .field("in_flight", &self.flight.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peers::loader_fn;
    use alloc::format;
    use alloc::vec::Vec;
    use std::collections::HashMap as StdHashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    fn db() -> StdHashMap<&'static str, &'static str> {
        [("Tom", "630"), ("Jack", "589"), ("Sam", "567")]
            .into_iter()
            .collect()
    }

    /// Loader over `db()` that counts invocations per key.
    fn counting_loader() -> (Arc<dyn Loader>, Arc<StdMutex<StdHashMap<String, usize>>>) {
        let counts = Arc::new(StdMutex::new(StdHashMap::new()));
        let sink = Arc::clone(&counts);
        let data = db();
        let loader = loader_fn(move |key: &str| {
            *sink.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
            match data.get(key) {
                Some(v) => Ok(v.as_bytes().to_vec()),
                None => Err(format!("{key} not exist").into()),
            }
        });
        (Arc::new(loader), counts)
    }

    fn group(max_bytes: u64, loader: Arc<dyn Loader>) -> Group {
        Group::new(
            GroupConfig {
                name: "scores".to_string(),
                max_bytes,
            },
            loader,
        )
    }

    struct FixedPicker(Option<Arc<dyn PeerGetter>>);

    impl PeerPicker for FixedPicker {
        fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
            self.0.clone()
        }
    }

    struct StubPeer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl PeerGetter for StubPeer {
        fn get(&self, group: &str, key: &str) -> core::result::Result<Vec<u8>, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("connection refused".into())
            } else {
                Ok(format!("{group}/{key}@remote").into_bytes())
            }
        }
    }

    #[test]
    fn test_group_read_through_loads_once() {
        let (loader, counts) = counting_loader();
        let scores = group(2 << 10, loader);

        for (k, v) in db() {
            assert_eq!(scores.get(k).unwrap().as_slice(), v.as_bytes());
            assert_eq!(scores.get(k).unwrap().as_slice(), v.as_bytes());
            assert_eq!(counts.lock().unwrap()[k], 1, "cache miss for {k}");
        }

        let stats = scores.stats();
        assert_eq!(stats.gets, 6);
        assert_eq!(stats.cache_hits, 3);
        assert_eq!(stats.local_loads, 3);
        assert_eq!(scores.cache_len(), 3);
    }

    #[test]
    fn test_group_unknown_key_is_loader_error() {
        let (loader, counts) = counting_loader();
        let scores = group(0, loader);

        let err = scores.get("unknown").unwrap_err();
        assert!(err.is_loader());
        assert_eq!(err.to_string(), "loader failed: unknown not exist");

        // Failures are not cached.
        assert!(scores.get("unknown").is_err());
        assert_eq!(counts.lock().unwrap()["unknown"], 2);
        assert!(!scores.is_cached("unknown"));
        assert_eq!(scores.stats().local_load_errs, 2);
    }

    #[test]
    fn test_group_empty_key() {
        let (loader, counts) = counting_loader();
        let scores = group(0, loader);
        assert!(scores.get("").unwrap_err().is_invalid_argument());
        assert!(counts.lock().unwrap().is_empty());
        assert_eq!(scores.stats().gets, 1);
        assert_eq!(scores.stats().loads, 0);
    }

    #[test]
    fn test_group_evictions_are_counted() {
        let (loader, _) = counting_loader();
        // "Tom"+"630" is 6 bytes; room for one entry.
        let scores = group(6, loader);
        scores.get("Tom").unwrap();
        scores.get("Sam").unwrap();
        assert_eq!(scores.cache_len(), 1);
        assert!(scores.is_cached("Sam"));
        assert_eq!(scores.stats().evictions, 1);
        assert!(scores.cache_bytes() <= 6);
    }

    #[test]
    fn test_group_remote_value_not_cached_locally() {
        let (loader, counts) = counting_loader();
        let scores = group(0, loader);
        let peer = Arc::new(StubPeer {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let getter: Arc<dyn PeerGetter> = peer.clone();
        scores.register_peers(Arc::new(FixedPicker(Some(getter))));

        assert_eq!(scores.get("Tom").unwrap().as_slice(), b"scores/Tom@remote");
        assert_eq!(scores.get("Tom").unwrap().as_slice(), b"scores/Tom@remote");
        assert_eq!(peer.calls.load(Ordering::SeqCst), 2);
        assert!(counts.lock().unwrap().is_empty());
        assert!(!scores.is_cached("Tom"));
        assert_eq!(scores.stats().peer_loads, 2);
    }

    #[test]
    fn test_group_peer_failure_falls_back_to_loader() {
        let (loader, counts) = counting_loader();
        let scores = group(0, loader);
        let peer = Arc::new(StubPeer {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let getter: Arc<dyn PeerGetter> = peer.clone();
        scores.register_peers(Arc::new(FixedPicker(Some(getter))));

        assert_eq!(scores.get("Jack").unwrap().as_slice(), b"589");
        assert_eq!(peer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(counts.lock().unwrap()["Jack"], 1);
        assert!(scores.is_cached("Jack"));

        let stats = scores.stats();
        assert_eq!(stats.peer_errors, 1);
        assert_eq!(stats.local_loads, 1);
    }

    #[test]
    fn test_group_picker_choosing_self_loads_locally() {
        let (loader, counts) = counting_loader();
        let scores = group(0, loader);
        scores.register_peers(Arc::new(FixedPicker(None)));
        assert_eq!(scores.get("Sam").unwrap().as_slice(), b"567");
        assert_eq!(counts.lock().unwrap()["Sam"], 1);
    }

    #[test]
    #[should_panic(expected = "register_peers called more than once")]
    fn test_group_register_peers_twice_panics() {
        let (loader, _) = counting_loader();
        let scores = group(0, loader);
        scores.register_peers(Arc::new(FixedPicker(None)));
        scores.register_peers(Arc::new(FixedPicker(None)));
    }

    #[test]
    fn test_group_metrics() {
        let (loader, _) = counting_loader();
        let scores = group(0, loader);
        scores.get("Tom").unwrap();
        scores.get("Tom").unwrap();
        let metrics = scores.metrics();
        assert_eq!(metrics.get("gets"), Some(&2.0));
        assert_eq!(metrics.get("cache_hits"), Some(&1.0));
        assert_eq!(metrics.get("cache_entries"), Some(&1.0));
        assert_eq!(metrics.get("cache_bytes"), Some(&6.0));
        assert_eq!(scores.algorithm_name(), "Group");
    }

    #[test]
    fn test_group_cold_get_counts_one_cache_miss() {
        let (loader, _) = counting_loader();
        let scores = group(0, loader);
        scores.get("Tom").unwrap();

        let cache = scores.cache_metrics();
        assert_eq!(cache.get("requests"), Some(&1.0));
        assert_eq!(cache.get("cache_misses"), Some(&1.0));

        scores.get("Tom").unwrap();
        let cache = scores.cache_metrics();
        assert_eq!(cache.get("requests"), Some(&2.0));
        assert_eq!(cache.get("cache_hits"), Some(&1.0));
        assert_eq!(cache.get("cache_misses"), Some(&1.0));
    }
}
