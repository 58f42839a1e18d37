//! Cache Metrics Demonstration
//!
//! Runs the same small workload against a bare `LruCache` and a `Group`, then
//! prints the BTreeMap reports both expose through the `CacheMetrics` trait.

use peercache::config::{GroupConfig, LruCacheConfig};
use peercache::metrics::CacheMetrics;
use peercache::{loader_fn, ByteView, Group, LruCache};
use std::collections::BTreeMap;
use std::sync::Arc;

const WORKLOAD: [&str; 10] = [
    "apple", "banana", "cherry", "apple", "date", "apple", "elderberry", "banana", "fig", "apple",
];

fn main() {
    println!("🚀 Cache Metrics - Demonstration");
    println!("================================\n");

    // Room for roughly three fruit entries, so the workload evicts.
    let max_bytes = 40;
    println!("📊 Workload: {} lookups, budget {max_bytes} bytes\n", WORKLOAD.len());

    let lru = run_lru(max_bytes);
    let group = run_group(max_bytes);

    let reporters: Vec<(&str, &dyn CacheMetrics)> = vec![("LruCache", &lru), ("Group", &*group)];
    for (label, reporter) in &reporters {
        print_report(label, reporter.algorithm_name(), &reporter.metrics());
    }

    println!("🧮 Group main cache as seen from inside:");
    for (name, value) in group.cache_metrics() {
        println!("   {name:<28} {value:>10.2}");
    }
}

/// Read-through by hand: look up, insert on miss.
fn run_lru(max_bytes: u64) -> LruCache<String, ByteView> {
    let mut cache = LruCache::init(LruCacheConfig { max_bytes }, None);
    for key in WORKLOAD {
        if cache.get(key).is_none() {
            cache.put(key.to_string(), ByteView::from(key.to_uppercase().into_bytes()));
        }
    }
    cache
}

fn run_group(max_bytes: u64) -> Arc<Group> {
    let group = Arc::new(Group::new(
        GroupConfig {
            name: "fruit".to_string(),
            max_bytes,
        },
        Arc::new(loader_fn(|key: &str| Ok(key.to_uppercase().into_bytes()))),
    ));
    for key in WORKLOAD {
        if let Err(err) = group.get(key) {
            println!("   ✗ {key}: {err}");
        }
    }
    group
}

fn print_report(label: &str, algorithm: &str, metrics: &BTreeMap<String, f64>) {
    println!("📈 {label} (reports as \"{algorithm}\")");
    for (name, value) in metrics {
        println!("   {name:<28} {value:>10.2}");
    }
    println!();
}
