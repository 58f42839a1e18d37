//! Consistent-hash ring mapping keys to the node that owns them.
//!
//! Every real node is placed on a 32-bit ring `replicas` times, at the hash of
//! `"{replica_index}{node}"`. A key belongs to the first virtual position at
//! or after its own hash, wrapping around past the largest position. Adding a
//! node therefore only takes over the keys that fall just before its new
//! positions: about `1 / (nodes + 1)` of the key space rather than all of it.
//!
//! ```text
//!         0 ─────────────────────────────────────────── u32::MAX
//!           ▲ B#1      ▲ A#0   key ●──▶ ▲ C#0      ▲ A#1
//!                                     owner = C
//! ```

extern crate alloc;

use crate::config::HashRingConfig;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Hash function placing keys and virtual nodes on the ring.
///
/// It must be deterministic across processes: every peer has to compute the
/// same owner for the same key.
pub type HashFn = fn(&[u8]) -> u32;

/// CRC-32 (IEEE), the default ring hash.
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// A consistent-hash ring of string node identifiers.
///
/// # Examples
///
/// ```
/// use peercache::HashRing;
///
/// let mut ring = HashRing::new(50);
/// ring.add(["10.0.0.1:8001", "10.0.0.2:8001", "10.0.0.3:8001"]);
///
/// let owner = ring.get("Tom").unwrap();
/// assert_eq!(ring.get("Tom"), Some(owner));
/// ```
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Virtual positions, strictly ascending.
    positions: Vec<u32>,
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring with `replicas` virtual nodes per real node,
    /// hashing with CRC-32.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32)
    }

    /// Creates an empty ring from a configuration and an optional hash
    /// function (CRC-32 when `None`).
    pub fn init(config: HashRingConfig, hash: Option<HashFn>) -> Self {
        Self::with_hasher(config.replicas, hash.unwrap_or(crc32))
    }

    /// Creates an empty ring with a custom hash function.
    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        HashRing {
            hash,
            replicas,
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Virtual nodes placed per real node.
    #[inline]
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Returns `true` when no node has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of virtual positions on the ring.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Places every node in `nodes` on the ring.
    ///
    /// If a virtual position collides with one already on the ring, the node
    /// added last owns it; positions are never duplicated.
    pub fn add<I>(&mut self, nodes: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{i}{node}").as_bytes());
                if self.owners.insert(position, node.to_string()).is_none() {
                    self.positions.push(position);
                }
            }
        }
        self.positions.sort_unstable();
    }

    /// Returns the node that owns `key`, or `None` on an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.positions.partition_point(|&p| p < hash);
        let position = self.positions[idx % self.positions.len()];
        self.owners.get(&position).map(String::as_str)
    }

    /// Distinct real nodes on the ring, sorted.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.owners.values().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("positions", &self.positions.len())
            .field("nodes", &self.nodes())
            .finish()
    }
}
