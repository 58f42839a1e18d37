#![no_std]
extern crate alloc;
extern crate peercache;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use peercache::config::{HashRingConfig, LruCacheConfig};
use peercache::metrics::CacheMetrics;
use peercache::{ByteView, HashRing, LruCache};

fn make_lru<K, V>(max_bytes: u64) -> LruCache<K, V>
where
    K: core::hash::Hash + Eq + Clone + peercache::ByteSize,
    V: peercache::ByteSize,
{
    LruCache::init(LruCacheConfig { max_bytes }, None)
}

#[test]
fn test_lru_in_no_std() {
    // Three 8-byte entries do not fit in 16 bytes.
    let mut cache: LruCache<String, String> = make_lru(16);

    let key1 = String::from("key1");
    let key2 = String::from("key2");
    let key3 = String::from("key3");

    cache.put(key1.clone(), String::from("val1"));
    cache.put(key2.clone(), String::from("val2"));

    assert_eq!(cache.get(&key1).map(String::as_str), Some("val1"));
    assert_eq!(cache.get(&key2).map(String::as_str), Some("val2"));

    // This should evict key1
    cache.put(key3.clone(), String::from("val3"));

    assert!(cache.get(&key1).is_none());
    assert_eq!(cache.get(&key2).map(String::as_str), Some("val2"));
    assert_eq!(cache.get(&key3).map(String::as_str), Some("val3"));
    assert_eq!(cache.used_bytes(), 16);
}

#[test]
fn test_lru_byte_values_in_no_std() {
    let mut cache: LruCache<String, ByteView> = make_lru(0);
    let bytes: Vec<u8> = (0u8..32).collect();
    cache.put("blob".to_string(), ByteView::from(bytes));

    let view = cache.get("blob").cloned().unwrap();
    assert_eq!(view.len(), 32);
    assert_eq!(view.at(31), Some(31));
    assert_eq!(cache.used_bytes(), 36);
    assert_eq!(cache.metrics().get("cache_hits"), Some(&1.0));
}

#[test]
fn test_ring_in_no_std() {
    let mut ring = HashRing::init(HashRingConfig { replicas: 20 }, None);
    assert!(ring.get("k").is_none());

    ring.add(["alpha", "beta", "gamma"]);
    assert_eq!(ring.len(), 60);

    let owners: Vec<String> = (0..30)
        .map(|i| ring.get(&format!("key-{i}")).unwrap().to_string())
        .collect();
    for (i, owner) in owners.iter().enumerate() {
        assert_eq!(ring.get(&format!("key-{i}")), Some(owner.as_str()));
        assert!(["alpha", "beta", "gamma"].contains(&owner.as_str()));
    }
}

#[test]
fn test_byteview_in_no_std() {
    let view = ByteView::from("hello");
    let copy = view.clone();
    assert_eq!(copy.as_slice(), b"hello");
    assert_eq!(view.slice(1..3), Some(&b"el"[..]));
    assert_eq!(view.slice(3..9), None);
    assert_eq!(view.to_string(), "hello");
}
