//! Concurrent Correctness Tests
//!
//! These tests check the guarantees cache groups make while many threads hit
//! them at once.
//!
//! ## Segments
//!
//! 1. **Coalescing**: concurrent misses for one key run one fetch
//! 2. **Invariants**: byte budgets and counters stay consistent under contention
//! 3. **Cluster**: in-process peers load each key exactly once

#![cfg(feature = "std")]

use peercache::config::GroupConfig;
use peercache::{
    loader_fn, Coalescer, Error, Group, GroupRegistry, LocalPeer, Loader, PeerGetter,
    PeerPicker, RingPeerPicker,
};
use scoped_threadpool::Pool;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// Loader that sleeps before answering, to widen the race window.
fn slow_loader(calls: Arc<AtomicUsize>, fail: bool) -> impl Loader {
    loader_fn(move |key: &str| {
        calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        if fail {
            Err(format!("backend down for {key}").into())
        } else {
            Ok(format!("value-of-{key}").into_bytes())
        }
    })
}

fn group(max_bytes: u64, loader: impl Loader + 'static) -> Arc<Group> {
    Arc::new(Group::new(
        GroupConfig {
            name: "scores".to_string(),
            max_bytes,
        },
        Arc::new(loader),
    ))
}

// ============================================================================
// SEGMENT 1: COALESCING
// ============================================================================

#[test]
fn test_concurrent_gets_load_once() {
    const CALLERS: usize = 16;
    let calls = Arc::new(AtomicUsize::new(0));
    let group = group(1 << 10, slow_loader(calls.clone(), false));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let group = group.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                group.get("hot-key")
            })
        })
        .collect();

    for handle in handles {
        let value = handle.join().unwrap().unwrap();
        assert_eq!(value.as_slice(), b"value-of-hot-key");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1, "loader ran more than once");
    let stats = group.stats();
    assert_eq!(stats.gets, CALLERS as u64);
    assert_eq!(stats.local_loads, 1);
}

#[test]
fn test_concurrent_gets_share_error() {
    const CALLERS: usize = 8;
    let calls = Arc::new(AtomicUsize::new(0));
    let group = group(0, slow_loader(calls.clone(), true));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let group = group.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                group.get("broken")
            })
        })
        .collect();

    for handle in handles {
        match handle.join().unwrap() {
            Err(Error::Loader(source)) => {
                assert_eq!(source.to_string(), "backend down for broken");
            }
            other => panic!("expected loader error, got {other:?}"),
        }
    }

    // Every miss either ran the loader or shared another caller's result.
    let stats = group.stats();
    let executed = calls.load(Ordering::SeqCst) as u64;
    assert_eq!(stats.loads, CALLERS as u64);
    assert_eq!(stats.loads_deduped + executed, CALLERS as u64);
    assert_eq!(stats.local_load_errs, executed);
    assert!(!group.is_cached("broken"));
}

#[test]
fn test_coalescer_with_thread_pool() {
    let flights: Coalescer<usize, String> = Coalescer::new();
    let runs = AtomicUsize::new(0);
    let barrier = Barrier::new(8);
    let mut pool = Pool::new(8);

    pool.scoped(|scope| {
        for _ in 0..8 {
            let (flights, runs, barrier) = (&flights, &runs, &barrier);
            scope.execute(move || {
                barrier.wait();
                let v = flights.do_call("shared", || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(50));
                    Ok(7)
                });
                assert_eq!(v, Ok(7));
            });
        }
    });

    let runs = runs.load(Ordering::SeqCst);
    assert!((1..=8).contains(&runs));
    assert_eq!(flights.in_flight(), 0);
}

// ============================================================================
// SEGMENT 2: INVARIANTS UNDER CONTENTION
// ============================================================================

#[test]
fn test_concurrent_distinct_keys_respect_budget() {
    const MAX_BYTES: u64 = 256;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let group = group(
        MAX_BYTES,
        loader_fn(move |key: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(key.repeat(2).into_bytes())
        }),
    );
    let mut pool = Pool::new(4);

    pool.scoped(|scope| {
        for t in 0..4 {
            let group = &group;
            scope.execute(move || {
                for i in 0..250 {
                    let key = format!("t{t}-k{}", i % 50);
                    let value = group.get(&key).unwrap();
                    assert_eq!(value.as_slice(), key.repeat(2).as_bytes());
                    assert!(group.cache_bytes() <= MAX_BYTES);
                }
            });
        }
    });

    let stats = group.stats();
    assert_eq!(stats.gets, 1000);
    assert_eq!(stats.cache_hits + stats.loads, stats.gets);
    assert_eq!(stats.local_loads, calls.load(Ordering::SeqCst) as u64);
    assert!(stats.evictions > 0);
    assert!(group.cache_bytes() <= MAX_BYTES);
}

// ============================================================================
// SEGMENT 3: IN-PROCESS CLUSTER
// ============================================================================

#[test]
fn test_cluster_loads_each_key_once_under_concurrency() {
    const NODES: usize = 3;
    const KEYS: usize = 40;

    let loads = Arc::new(AtomicUsize::new(0));
    let registries: Vec<Arc<GroupRegistry>> =
        (0..NODES).map(|_| Arc::new(GroupRegistry::new())).collect();
    let groups: Vec<Arc<Group>> = registries
        .iter()
        .map(|registry| {
            registry.new_group("scores", 1 << 20, slow_loader(loads.clone(), false))
        })
        .collect();

    let getters: Vec<(String, Arc<dyn PeerGetter>)> = registries
        .iter()
        .enumerate()
        .map(|(i, registry)| {
            let id = format!("node-{i}");
            let getter: Arc<dyn PeerGetter> =
                Arc::new(LocalPeer::new(id.clone(), registry.clone()));
            (id, getter)
        })
        .collect();
    for (i, group) in groups.iter().enumerate() {
        let picker = RingPeerPicker::new(format!("node-{i}"));
        picker.set_peers(getters.iter().cloned());
        let picker: Arc<dyn PeerPicker> = Arc::new(picker);
        group.register_peers(picker);
    }

    let mut pool = Pool::new(6);
    pool.scoped(|scope| {
        for t in 0..6 {
            let groups = &groups;
            scope.execute(move || {
                for i in 0..KEYS * 2 {
                    let key = format!("key-{}", (i + t) % KEYS);
                    let node = &groups[(i + t) % NODES];
                    let value = node.get(&key).unwrap();
                    assert_eq!(value.as_slice(), format!("value-of-{key}").as_bytes());
                }
            });
        }
    });

    assert_eq!(loads.load(Ordering::SeqCst), KEYS);

    let cached: HashSet<String> = (0..KEYS)
        .map(|i| format!("key-{i}"))
        .filter(|key| groups.iter().any(|g| g.is_cached(key)))
        .collect();
    assert_eq!(cached.len(), KEYS);
    for i in 0..KEYS {
        let key = format!("key-{i}");
        let holders = groups.iter().filter(|g| g.is_cached(&key)).count();
        assert_eq!(holders, 1, "{key} cached on {holders} nodes");
    }
}
