//! In-process cluster construction
//!
//! Every simulated node is a `GroupRegistry` holding one `Group` named
//! [`GROUP_NAME`]. Nodes reach each other through `LocalPeer`, optionally
//! wrapped in [`FlakyPeer`] to inject transport failures.

use crate::models::SimulationConfig;
use crate::workload::MISSING_PREFIX;
use peercache::config::HashRingConfig;
use peercache::{
    loader_fn, BoxError, Group, GroupRegistry, LocalPeer, PeerGetter, PeerPicker, RingPeerPicker,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

pub const GROUP_NAME: &str = "objects";

/// One simulated process
pub struct SimNode {
    pub id: String,
    pub registry: Arc<GroupRegistry>,
    pub group: Arc<Group>,
}

/// A [`PeerGetter`] that fails a fixed share of calls before reaching its peer.
struct FlakyPeer {
    inner: LocalPeer,
    failure_rate: f64,
}

impl PeerGetter for FlakyPeer {
    fn get(&self, group: &str, key: &str) -> Result<Vec<u8>, BoxError> {
        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            return Err(format!("simulated transport failure to {}", self.inner.id()).into());
        }
        self.inner.get(group, key)
    }
}

/// All nodes of a simulated cluster, plus a counter of backing-store calls.
pub struct Cluster {
    pub nodes: Vec<SimNode>,
    backing_loads: Arc<AtomicU64>,
}

impl Cluster {
    /// Builds `config.nodes` nodes sharing one ring membership.
    pub fn build(config: &SimulationConfig) -> Self {
        let backing_loads = Arc::new(AtomicU64::new(0));

        let nodes: Vec<SimNode> = (0..config.nodes.max(1))
            .map(|i| {
                let id = format!("node-{i}");
                let registry = Arc::new(GroupRegistry::new());
                let counter = Arc::clone(&backing_loads);
                let latency = config.loader_latency;
                let value_size = config.value_size;
                let group = registry.new_group(
                    GROUP_NAME,
                    config.max_bytes,
                    loader_fn(move |key: &str| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        if !latency.is_zero() {
                            thread::sleep(latency);
                        }
                        if key.starts_with(MISSING_PREFIX) {
                            return Err(format!("{key} not in backing store").into());
                        }
                        Ok(synthesize_value(key, value_size))
                    }),
                );
                SimNode {
                    id,
                    registry,
                    group,
                }
            })
            .collect();

        let getters: Vec<(String, Arc<dyn PeerGetter>)> = nodes
            .iter()
            .map(|node| {
                let getter: Arc<dyn PeerGetter> = Arc::new(FlakyPeer {
                    inner: LocalPeer::new(node.id.clone(), Arc::clone(&node.registry)),
                    failure_rate: config.peer_failure_rate,
                });
                (node.id.clone(), getter)
            })
            .collect();

        let ring = HashRingConfig {
            replicas: config.replicas,
        };
        for node in &nodes {
            let picker = RingPeerPicker::init(node.id.clone(), ring, None);
            picker.set_peers(getters.iter().cloned());
            debug!(node = %node.id, peers = ?picker.peers(), "wired node");
            let picker: Arc<dyn PeerPicker> = Arc::new(picker);
            node.group.register_peers(picker);
        }

        info!(
            nodes = nodes.len(),
            replicas = config.replicas,
            max_bytes = config.max_bytes,
            "cluster ready"
        );
        Cluster {
            nodes,
            backing_loads,
        }
    }

    /// Node receiving requests addressed to `index`.
    pub fn node(&self, index: usize) -> &SimNode {
        &self.nodes[index % self.nodes.len()]
    }

    /// Calls that reached the backing store so far.
    pub fn backing_loads(&self) -> u64 {
        self.backing_loads.load(Ordering::Relaxed)
    }
}

/// Deterministic value of `size` bytes for `key`.
fn synthesize_value(key: &str, size: usize) -> Vec<u8> {
    key.bytes().cycle().take(size.max(1)).collect()
}
