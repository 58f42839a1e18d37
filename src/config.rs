//! Configuration Module
//!
//! Configuration structures for the building blocks of the cache. Each
//! component has its own dedicated struct with public fields.
//!
//! # Design Philosophy
//!
//! Configuration structs have all public fields for simple instantiation:
//!
//! - **Simple**: Just create the struct with all fields set
//! - **Type safety**: All parameters must be provided at construction
//! - **No boilerplate**: No constructors or builder methods needed
//!
//! # Sizing Guidelines
//!
//! `max_bytes` bounds the *accounted* size of a cache: the sum of key length and
//! value length over every resident entry. It does not include the per-entry
//! bookkeeping (arena node, map slot), which adds roughly 48-64 bytes per
//! entry on top:
//!
//! ```text
//! Total Memory ≈ max_bytes + (entries × overhead_per_entry)
//! overhead_per_entry ≈ 48-64 bytes (arena links, map slot, Arc header)
//! ```
//!
//! A `max_bytes` of `0` disables eviction entirely.
//!
//! # Config Types
//!
//! | Config | Used by | Description |
//! |--------|---------|-------------|
//! | `LruCacheConfig` | [`LruCache`](crate::LruCache) | Byte budget of one eviction cache |
//! | `HashRingConfig` | [`HashRing`](crate::HashRing) | Virtual nodes per real node |
//! | `GroupConfig` | `Group` | Name and byte budget of a cache namespace |
//!
//! # Examples
//!
//! ```
//! use peercache::config::LruCacheConfig;
//! use peercache::LruCache;
//!
//! // 64MB budget for keys and values
//! let config = LruCacheConfig {
//!     max_bytes: 64 * 1024 * 1024,
//! };
//! let cache: LruCache<String, Vec<u8>> = LruCache::init(config, None);
//! assert_eq!(cache.max_bytes(), 64 * 1024 * 1024);
//! ```

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Number of virtual nodes placed on the ring for every real node when the
/// caller does not pick one.
pub const DEFAULT_REPLICAS: usize = 50;

/// Configuration for a byte-bounded LRU cache.
///
/// # Fields
///
/// - `max_bytes`: Upper bound on `Σ len(key) + len(value)` across resident
///   entries. `0` means unbounded.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct LruCacheConfig {
    /// Maximum accounted bytes. `0` disables eviction.
    pub max_bytes: u64,
}

impl fmt::Debug for LruCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCacheConfig")
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

/// Configuration for a consistent-hash ring.
///
/// More replicas smooth the key distribution across a small number of real
/// nodes at the cost of a larger position table (`nodes × replicas` entries).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HashRingConfig {
    /// Virtual positions per real node.
    pub replicas: usize,
}

impl Default for HashRingConfig {
    fn default() -> Self {
        HashRingConfig {
            replicas: DEFAULT_REPLICAS,
        }
    }
}

impl fmt::Debug for HashRingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRingConfig")
            .field("replicas", &self.replicas)
            .finish()
    }
}

/// Configuration for a cache group (one named namespace).
///
/// # Examples
///
/// ```
/// use peercache::config::GroupConfig;
///
/// let config = GroupConfig {
///     name: "scores".to_string(),
///     max_bytes: 2 << 10,
/// };
/// assert_eq!(config.cache().max_bytes, 2048);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Namespace name, unique within a registry.
    pub name: String,
    /// Byte budget of the group's main cache. `0` means unbounded.
    pub max_bytes: u64,
}

impl GroupConfig {
    /// Derives the configuration of the group's main cache.
    pub fn cache(&self) -> LruCacheConfig {
        LruCacheConfig {
            max_bytes: self.max_bytes,
        }
    }
}

impl fmt::Debug for GroupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupConfig")
            .field("name", &self.name)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_lru_config_creation() {
        let config = LruCacheConfig {
            max_bytes: 10 * 1024 * 1024,
        };
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(LruCacheConfig::default().max_bytes, 0);
    }

    #[test]
    fn test_ring_config_default() {
        assert_eq!(HashRingConfig::default().replicas, DEFAULT_REPLICAS);
    }

    #[test]
    fn test_group_config_derives_cache_config() {
        let config = GroupConfig {
            name: "scores".to_string(),
            max_bytes: 4096,
        };
        assert_eq!(config.cache(), LruCacheConfig { max_bytes: 4096 });
    }
}
