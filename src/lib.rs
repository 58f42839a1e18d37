//! # peercache
//!
//! Building blocks of a distributed read-through cache. Every process in a
//! cluster holds a byte-bounded LRU per named *group*; keys are partitioned
//! across processes with a consistent-hash ring, so each key has one owner
//! that loads it from the backing store and keeps it hot.
//!
//! ```text
//! ┌──────────────────────────── process A ────────────────────────────┐
//! │  GroupRegistry                                                    │
//! │   └─ Group "scores"                                               │
//! │        ├─ LruCache<String, ByteView>   (main cache, byte budget)  │
//! │        ├─ Coalescer                    (one fetch per key)        │
//! │        ├─ PeerPicker ── HashRing ──▶ owner = B ──▶ PeerGetter(B) ─┼──▶ process B
//! │        └─ Loader                       (backing store)            │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Type | Role |
//! |------|------|
//! | [`LruCache`] | Recency-ordered cache bounded by accounted bytes |
//! | [`HashRing`] | Consistent hashing of keys onto node identifiers |
//! | [`Coalescer`] | Deduplicates concurrent fetches of the same key |
//! | [`Group`] | Named namespace tying the pieces together |
//! | [`GroupRegistry`] | Name → group lookup for a process |
//! | [`RingPeerPicker`] | Ring-backed [`PeerPicker`] |
//! | [`LocalPeer`] | In-process [`PeerGetter`] over another registry |
//!
//! ## Example
//!
//! ```rust
//! use peercache::{loader_fn, GroupRegistry};
//!
//! let registry = GroupRegistry::new();
//! let scores = registry.new_group("scores", 2 << 10, loader_fn(|key: &str| match key {
//!     "Tom" => Ok(b"630".to_vec()),
//!     "Jack" => Ok(b"589".to_vec()),
//!     _ => Err(format!("{key} not exist").into()),
//! }));
//!
//! assert_eq!(scores.get("Tom").unwrap().to_string(), "630");
//! assert_eq!(scores.get("Tom").unwrap().to_string(), "630"); // served from cache
//! assert_eq!(scores.stats().local_loads, 1);
//! ```
//!
//! ## Features
//!
//! - `std` (default): groups, the registry, call coalescing and the peer
//!   traits. Pulls in `parking_lot`, `thiserror` and `tracing`.
//! - `hashbrown` (default): hashbrown maps instead of `std::collections`.
//!
//! Without `std` the crate is `no_std` + `alloc` and provides [`LruCache`],
//! [`HashRing`], [`ByteView`], configuration and metrics.
//!
//! ## Modules
//!
//! - [`lru`]: Byte-bounded LRU eviction cache
//! - [`ring`]: Consistent-hash ring
//! - [`byteview`]: Immutable shared byte views
//! - [`config`]: Configuration structures
//! - [`metrics`]: Metrics collection for caches and groups
//! - [`coalesce`]: Call coalescing (requires `std`)
//! - [`peers`]: Loader and peer traits (requires `std`)
//! - [`group`]: Cache groups (requires `std`)
//! - [`registry`]: Group registry (requires `std`)
//! - [`error`]: Error types (requires `std`)

#![no_std]

extern crate alloc;

#[cfg(any(feature = "std", not(feature = "hashbrown")))]
extern crate std;

/// Arena-backed doubly linked list used for recency ordering.
///
/// Internal infrastructure: nodes are addressed by index into a slab, so
/// relinking never touches raw pointers.
pub(crate) mod list;

/// Configuration structures.
pub mod config;

/// Byte-bounded Least Recently Used (LRU) cache.
///
/// Provides the eviction cache that bounds every group's memory use by the
/// accounted size of keys and values.
pub mod lru;

/// Consistent-hash ring.
pub mod ring;

/// Immutable byte views.
pub mod byteview;

/// Cache metrics system.
///
/// Provides BTreeMap-based metrics reporting shared by the eviction cache and
/// cache groups.
pub mod metrics;

/// Error types.
#[cfg(feature = "std")]
pub mod error;

/// Call coalescing for concurrent fetches of the same key.
#[cfg(feature = "std")]
pub mod coalesce;

/// Loader and peer collaborator traits, plus the ring-backed picker.
#[cfg(feature = "std")]
pub mod peers;

/// Cache groups.
#[cfg(feature = "std")]
pub mod group;

/// Registry of named groups.
#[cfg(feature = "std")]
pub mod registry;

pub use byteview::ByteView;
pub use lru::{ByteSize, LruCache, OnEvicted};
pub use metrics::CacheMetrics;
pub use ring::{HashFn, HashRing};

#[cfg(feature = "std")]
pub use coalesce::Coalescer;
#[cfg(feature = "std")]
pub use error::{BoxError, Error, Result};
#[cfg(feature = "std")]
pub use group::Group;
#[cfg(feature = "std")]
pub use peers::{
    loader_fn, LocalPeer, Loader, LoaderFn, NoPeers, PeerGetter, PeerPicker, RingPeerPicker,
};
#[cfg(feature = "std")]
pub use registry::GroupRegistry;
