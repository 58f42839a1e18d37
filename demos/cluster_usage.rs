//! Three-Node Cluster in One Process
//!
//! Builds three "processes" (each a `GroupRegistry` with a `scores` group),
//! wires them together with `RingPeerPicker` + `LocalPeer`, and shows that
//! every key is loaded once, by the node that owns it, no matter which node
//! is asked.

use peercache::{loader_fn, GroupRegistry, LocalPeer, PeerGetter, PeerPicker, RingPeerPicker};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Node {
    id: String,
    registry: Arc<GroupRegistry>,
    picker: Arc<RingPeerPicker>,
    loads: Arc<AtomicUsize>,
}

fn slow_db() -> HashMap<&'static str, &'static str> {
    [("Tom", "630"), ("Jack", "589"), ("Sam", "567"), ("Kate", "712")]
        .into_iter()
        .collect()
}

fn main() {
    println!("🌐 peercache - in-process cluster demo");
    println!("======================================\n");

    let nodes: Vec<Node> = ["10.0.0.1:8001", "10.0.0.2:8001", "10.0.0.3:8001"]
        .into_iter()
        .map(|id| {
            let registry = Arc::new(GroupRegistry::new());
            let loads = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&loads);
            let db = slow_db();
            registry.new_group(
                "scores",
                2 << 10,
                loader_fn(move |key: &str| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    db.get(key)
                        .map(|v| v.as_bytes().to_vec())
                        .ok_or_else(|| format!("{key} not exist").into())
                }),
            );
            Node {
                id: id.to_string(),
                registry,
                picker: Arc::new(RingPeerPicker::new(id)),
                loads,
            }
        })
        .collect();

    let getters: Vec<(String, Arc<dyn PeerGetter>)> = nodes
        .iter()
        .map(|n| {
            let getter: Arc<dyn PeerGetter> =
                Arc::new(LocalPeer::new(n.id.clone(), Arc::clone(&n.registry)));
            (n.id.clone(), getter)
        })
        .collect();

    for node in &nodes {
        node.picker.set_peers(getters.iter().cloned());
        if let Some(group) = node.registry.get_group("scores") {
            let picker: Arc<dyn PeerPicker> = node.picker.clone();
            group.register_peers(picker);
        }
    }

    println!("📍 Key ownership:");
    for key in ["Tom", "Jack", "Sam", "Kate", "Nobody"] {
        let owner = nodes[0].picker.owner(key).unwrap_or_default();
        println!("   {key:<8} → {owner}");
    }
    println!();

    println!("🔁 Asking every node for every key, twice:");
    for _round in 0..2 {
        for node in &nodes {
            let Some(group) = node.registry.get_group("scores") else {
                continue;
            };
            for key in ["Tom", "Jack", "Sam", "Kate", "Nobody"] {
                match group.get(key) {
                    Ok(value) => println!("   {} {key:<8} = {value}", node.id),
                    Err(err) => println!("   {} {key:<8} ✗ {err}", node.id),
                }
            }
        }
    }
    println!();

    println!("📊 Per-node counters:");
    println!(
        "   {:<16} {:>6} {:>6} {:>6} {:>6} {:>8}",
        "node", "gets", "hits", "peer", "local", "entries"
    );
    for node in &nodes {
        let Some(group) = node.registry.get_group("scores") else {
            continue;
        };
        let stats = group.stats();
        println!(
            "   {:<16} {:>6} {:>6} {:>6} {:>6} {:>8}",
            node.id,
            stats.gets,
            stats.cache_hits,
            stats.peer_loads,
            stats.local_loads,
            group.cache_len()
        );
    }

    let total: usize = nodes.iter().map(|n| n.loads.load(Ordering::SeqCst)).sum();
    println!("\n✅ Backing store calls: {total} (one per found key, plus retried misses)");
}
