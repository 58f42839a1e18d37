// Data models for cluster simulation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One lookup in a workload: which node is asked, and for which key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Index of the node that receives the request
    pub node: usize,
    /// Cache key
    pub key: String,
}

impl Request {
    pub fn new(node: usize, key: String) -> Self {
        Self { node, key }
    }
}

/// Cluster and execution parameters of a simulation run
#[derive(Clone)]
pub struct SimulationConfig {
    /// Number of in-process nodes
    pub nodes: usize,
    /// Byte budget of each node's group cache (0 = unbounded)
    pub max_bytes: u64,
    /// Virtual nodes per real node on the hash ring
    pub replicas: usize,
    /// Worker threads issuing requests
    pub threads: usize,
    /// Simulated backing-store latency per load
    pub loader_latency: Duration,
    /// Size of every loaded value in bytes
    pub value_size: usize,
    /// Probability that a peer fetch fails and the caller falls back locally
    pub peer_failure_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nodes: 3,
            max_bytes: 1 << 20,
            replicas: peercache::config::DEFAULT_REPLICAS,
            threads: 4,
            loader_latency: Duration::from_micros(200),
            value_size: 256,
            peer_failure_rate: 0.0,
        }
    }
}

impl fmt::Debug for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationConfig")
            .field("nodes", &self.nodes)
            .field("max_bytes", &self.max_bytes)
            .field("replicas", &self.replicas)
            .field("threads", &self.threads)
            .field("loader_latency", &self.loader_latency)
            .field("value_size", &self.value_size)
            .field("peer_failure_rate", &self.peer_failure_rate)
            .finish()
    }
}

/// Per-node results, one CSV row each
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub node: String,
    pub gets: u64,
    pub cache_hits: u64,
    pub hit_rate: f64,
    pub loads: u64,
    pub loads_deduped: u64,
    pub peer_loads: u64,
    pub peer_errors: u64,
    pub local_loads: u64,
    pub local_load_errs: u64,
    pub evictions: u64,
    pub cache_entries: usize,
    pub cache_bytes: u64,
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub nodes: Vec<NodeReport>,
    pub total_requests: usize,
    pub unique_keys: usize,
    pub failed_requests: u64,
    /// Calls that reached the backing store, across all nodes
    pub backing_loads: u64,
    pub duration: Duration,
}

impl SimulationResult {
    /// Fraction of group lookups served from cache, counting lookups a node
    /// forwarded to an owner on both sides.
    pub fn cluster_hit_rate(&self) -> f64 {
        let gets: u64 = self.nodes.iter().map(|n| n.gets).sum();
        let hits: u64 = self.nodes.iter().map(|n| n.cache_hits).sum();
        if gets > 0 {
            hits as f64 / gets as f64
        } else {
            0.0
        }
    }
}
