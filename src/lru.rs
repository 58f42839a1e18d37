//! Byte-Bounded Least Recently Used (LRU) Cache
//!
//! This module provides the eviction cache that backs every cache group. It
//! keeps entries in recency order and bounds the *accounted size* of its
//! contents rather than the number of entries.
//!
//! # Algorithm
//!
//! Entries live in an arena-backed recency list (front = most recently used)
//! with a side map from key to arena index. A hit moves the entry to the
//! front; an insert pushes a new entry to the front. After every insert or
//! update, entries are popped from the back until the accounted size fits
//! the budget again.
//!
//! The accounted size of an entry is `key.byte_size() + value.byte_size()`,
//! and the cache maintains
//!
//! ```text
//! used_bytes == Σ (key.byte_size() + value.byte_size())   over resident entries
//! used_bytes <= max_bytes                                  when max_bytes != 0
//! ```
//!
//! after every mutating call returns. A `max_bytes` of `0` never evicts.
//!
//! # Performance Characteristics
//!
//! - Get: O(1)
//! - Put: O(1) amortized (plus one O(1) step per evicted entry)
//! - Remove oldest: O(1)
//!
//! # Thread Safety
//!
//! This implementation is not thread-safe. Cache groups serialize access by
//! wrapping it in a single `parking_lot::Mutex`.

extern crate alloc;

use crate::config::LruCacheConfig;
use crate::list::List;
use crate::metrics::{CacheMetrics, LruCacheMetrics};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// The cost, in bytes, that an entry charges against a cache's budget.
///
/// Keys and values both implement it; the cache charges their sum.
pub trait ByteSize {
    /// Number of bytes this value accounts for.
    fn byte_size(&self) -> usize;
}

impl ByteSize for str {
    #[inline]
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl ByteSize for String {
    #[inline]
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl ByteSize for [u8] {
    #[inline]
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl ByteSize for Vec<u8> {
    #[inline]
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl ByteSize for Box<[u8]> {
    #[inline]
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl<T: ByteSize + ?Sized> ByteSize for &T {
    #[inline]
    fn byte_size(&self) -> usize {
        (**self).byte_size()
    }
}

/// Callback invoked synchronously with every evicted entry.
///
/// It runs on the thread performing the triggering `put`, while whatever
/// lock guards the cache is still held, so it must not re-enter that cache.
pub type OnEvicted<K, V> = Box<dyn FnMut(&K, &V) + Send>;

/// A recency-ordered cache bounded by accounted bytes.
///
/// # Examples
///
/// ```
/// use peercache::LruCache;
///
/// // "k1"+"v1" and "k2"+"v2" are 4 bytes each; room for exactly two.
/// let mut cache: LruCache<String, String> = LruCache::new(8);
/// cache.put("k1".to_string(), "v1".to_string());
/// cache.put("k2".to_string(), "v2".to_string());
///
/// // Touching k1 makes k2 the eviction candidate.
/// assert!(cache.get("k1").is_some());
/// cache.put("k3".to_string(), "v3".to_string());
///
/// assert!(cache.get("k2").is_none());
/// assert_eq!(cache.len(), 2);
/// assert_eq!(cache.used_bytes(), 8);
/// ```
pub struct LruCache<K, V, S = DefaultHashBuilder> {
    config: LruCacheConfig,
    used_bytes: u64,
    list: List<(K, V)>,
    map: HashMap<K, usize, S>,
    on_evicted: Option<OnEvicted<K, V>>,
    metrics: LruCacheMetrics,
}

impl<K, V> LruCache<K, V, DefaultHashBuilder>
where
    K: Hash + Eq + Clone + ByteSize,
    V: ByteSize,
{
    /// Creates a cache bounded by `max_bytes` (`0` = unbounded) with no
    /// eviction callback.
    pub fn new(max_bytes: u64) -> Self {
        Self::init(LruCacheConfig { max_bytes }, None)
    }

    /// Creates a cache from a configuration and an optional eviction callback.
    pub fn init(config: LruCacheConfig, on_evicted: Option<OnEvicted<K, V>>) -> Self {
        Self::with_hasher(config, on_evicted, DefaultHashBuilder::default())
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq + Clone + ByteSize,
    V: ByteSize,
    S: BuildHasher,
{
    /// Creates a cache with a custom hash builder for the key index.
    pub fn with_hasher(
        config: LruCacheConfig,
        on_evicted: Option<OnEvicted<K, V>>,
        hash_builder: S,
    ) -> Self {
        LruCache {
            config,
            used_bytes: 0,
            list: List::new(),
            map: HashMap::with_hasher(hash_builder),
            on_evicted,
            metrics: LruCacheMetrics::new(config.max_bytes),
        }
    }

    /// Maximum accounted bytes; `0` means unbounded.
    #[inline]
    pub fn max_bytes(&self) -> u64 {
        self.config.max_bytes
    }

    /// Accounted bytes currently resident.
    #[inline]
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    /// Number of resident entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Looks up `key`, promoting it to most recently used on a hit.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(idx) = self.map.get(key).copied() else {
            self.metrics.core.record_miss();
            return None;
        };
        self.list.move_to_front(idx);
        let (_, value) = self.list.get(idx)?;
        self.metrics.core.record_hit(value.byte_size() as u64);
        Some(value)
    }

    /// Looks up `key` without promoting it or counting the lookup.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = self.map.get(key).copied()?;
        self.list.get(idx).map(|(_, v)| v)
    }

    /// Returns `true` if `key` is resident, without touching its recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Inserts or replaces the value for `key` and marks it most recently used.
    ///
    /// Replacing adjusts the accounted size by the difference between the old
    /// and new value. Afterwards least recently used entries are evicted until
    /// the budget holds again, which may include the entry just written if it
    /// alone exceeds `max_bytes`.
    pub fn put(&mut self, key: K, value: V) {
        let value_size = value.byte_size() as u64;

        if let Some(idx) = self.map.get(&key).copied() {
            self.list.move_to_front(idx);
            if let Some(entry) = self.list.get_mut(idx) {
                let old_size = entry.1.byte_size() as u64;
                entry.1 = value;
                self.used_bytes = self.used_bytes - old_size + value_size;
            }
            self.metrics.core.record_update(value_size);
        } else {
            let entry_size = key.byte_size() as u64 + value_size;
            let idx = self.list.push_front((key.clone(), value));
            self.map.insert(key, idx);
            self.used_bytes += entry_size;
            self.metrics.core.record_insertion(entry_size);
        }

        while self.config.max_bytes != 0 && self.used_bytes > self.config.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
        }
    }

    /// Evicts the least recently used entry and returns it.
    ///
    /// The eviction callback, if any, sees the entry before it is returned.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.pop_back()?;
        self.map.remove(&key);
        self.used_bytes -= key.byte_size() as u64 + value.byte_size() as u64;
        self.metrics.core.record_eviction();
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&key, &value);
        }
        Some((key, value))
    }

    /// Iterates over keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.list.iter().map(|(k, _)| k)
    }

    /// Returns the raw metrics counters.
    #[inline]
    pub fn stats(&self) -> &LruCacheMetrics {
        &self.metrics
    }
}

impl<K, V, S> CacheMetrics for LruCache<K, V, S>
where
    K: Hash + Eq + Clone + ByteSize,
    V: ByteSize,
    S: BuildHasher,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.metrics.to_btreemap(self.used_bytes)
    }

    fn algorithm_name(&self) -> &'static str {
        self.metrics.algorithm_name()
    }
}

impl<K, V, S> fmt::Debug for LruCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.config.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.list.len())
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}
