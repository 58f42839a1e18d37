//! Simulation runner
//!
//! Splits a workload across worker threads; each request goes to the node
//! it names, which either answers from cache, forwards to the key's owner,
//! or loads from the simulated backing store.

use crate::cluster::Cluster;
use crate::models::{NodeReport, Request, SimulationConfig, SimulationResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{info, trace};

pub struct SimulationRunner {
    config: SimulationConfig,
    requests: Vec<Request>,
}

impl SimulationRunner {
    pub fn new(config: SimulationConfig, requests: Vec<Request>) -> Self {
        Self { config, requests }
    }

    /// Builds the cluster, replays the workload and collects per-node stats.
    pub fn run(&self) -> SimulationResult {
        let cluster = Cluster::build(&self.config);
        let failed = AtomicU64::new(0);
        let threads = self.config.threads.max(1);
        let chunk = self.requests.len().div_ceil(threads).max(1);

        info!(
            requests = self.requests.len(),
            threads,
            "replaying workload"
        );
        let start = Instant::now();
        thread::scope(|scope| {
            for (worker, slice) in self.requests.chunks(chunk).enumerate() {
                let (cluster, failed) = (&cluster, &failed);
                scope.spawn(move || {
                    for request in slice {
                        let node = cluster.node(request.node);
                        if let Err(err) = node.group.get(&request.key) {
                            trace!(
                                worker,
                                node = %node.id,
                                key = %request.key,
                                error = %err,
                                "request failed"
                            );
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });
        let duration = start.elapsed();

        let unique_keys = self
            .requests
            .iter()
            .map(|r| r.key.as_str())
            .collect::<HashSet<_>>()
            .len();

        SimulationResult {
            nodes: cluster.nodes.iter().map(report).collect(),
            total_requests: self.requests.len(),
            unique_keys,
            failed_requests: failed.load(Ordering::Relaxed),
            backing_loads: cluster.backing_loads(),
            duration,
        }
    }
}

fn report(node: &crate::cluster::SimNode) -> NodeReport {
    let stats = node.group.stats();
    NodeReport {
        node: node.id.clone(),
        gets: stats.gets,
        cache_hits: stats.cache_hits,
        hit_rate: stats.hit_rate(),
        loads: stats.loads,
        loads_deduped: stats.loads_deduped,
        peer_loads: stats.peer_loads,
        peer_errors: stats.peer_errors,
        local_loads: stats.local_loads,
        local_load_errs: stats.local_load_errs,
        evictions: stats.evictions,
        cache_entries: node.group.cache_len(),
        cache_bytes: node.group.cache_bytes(),
    }
}
