//! Workload generation and persistence
//!
//! Workloads are lists of [`Request`]s. Key popularity follows a Zipf-like
//! distribution so a small set of keys receives most of the traffic, and a
//! configurable share of requests asks for keys the backing store does not
//! have.

use crate::models::Request;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

/// Prefix of keys whose load always fails.
pub const MISSING_PREFIX: &str = "missing-";

/// Parameters for generating a synthetic workload
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of requests
    pub requests: usize,
    /// Number of distinct keys
    pub unique_keys: usize,
    /// Zipf exponent; 0 is uniform, larger values concentrate traffic
    pub skew: f64,
    /// Number of nodes requests are spread over
    pub nodes: usize,
    /// Percentage of requests for keys that fail to load
    pub missing_percent: u8,
    /// RNG seed, for reproducible runs
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            requests: 100_000,
            unique_keys: 10_000,
            skew: 0.9,
            nodes: 3,
            missing_percent: 1,
            seed: 42,
        }
    }
}

/// Samples key ranks with probability proportional to `1 / rank^skew`.
struct ZipfSampler {
    cumulative: Vec<f64>,
}

impl ZipfSampler {
    fn new(n: usize, skew: f64) -> Self {
        let mut total = 0.0;
        let cumulative = (1..=n.max(1))
            .map(|rank| {
                total += 1.0 / (rank as f64).powf(skew);
                total
            })
            .collect();
        Self { cumulative }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let total = self.cumulative.last().copied().unwrap_or(1.0);
        let target = rng.gen::<f64>() * total;
        self.cumulative
            .partition_point(|&c| c < target)
            .min(self.cumulative.len() - 1)
    }
}

/// Generates a workload from `config`.
pub fn generate(config: &WorkloadConfig) -> Vec<Request> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let sampler = ZipfSampler::new(config.unique_keys, config.skew);
    let nodes = config.nodes.max(1);

    (0..config.requests)
        .map(|_| {
            let node = rng.gen_range(0..nodes);
            let rank = sampler.sample(&mut rng);
            let key = if rng.gen_range(0..100u8) < config.missing_percent {
                format!("{MISSING_PREFIX}{rank}")
            } else {
                format!("object-{rank:07}")
            };
            Request::new(node, key)
        })
        .collect()
}

/// Writes a workload as CSV with a `node,key` header.
pub fn write_csv(path: &Path, requests: &[Request]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for request in requests {
        writer.serialize(request)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a workload written by [`write_csv`].
pub fn read_csv(path: &Path) -> Result<Vec<Request>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    reader.deserialize().collect()
}
