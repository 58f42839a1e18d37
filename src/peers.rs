//! Collaborator traits and peer routing.
//!
//! A group talks to the outside world through three narrow traits:
//!
//! - [`Loader`] produces a value from the backing store on a local miss.
//! - [`PeerPicker`] decides whether another process owns a key.
//! - [`PeerGetter`] fetches a key from that other process.
//!
//! [`RingPeerPicker`] is the usual picker: a [`HashRing`] over every peer's
//! identifier plus knowledge of which identifier is "self". [`LocalPeer`] is
//! an in-process [`PeerGetter`] that serves requests from another
//! [`GroupRegistry`], which is enough to run a whole cluster inside one
//! process (see the `group-simulator` tool).

use crate::config::HashRingConfig;
use crate::error::{BoxError, Error};
use crate::registry::GroupRegistry;
use crate::ring::{crc32, HashFn, HashRing};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use parking_lot::RwLock;
use tracing::debug;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Loads the value for a key from the backing store.
///
/// Called only on a local miss for keys this process owns, or after a remote
/// fetch failed. Must be safe to call concurrently for different keys; the
/// group already guarantees one call at a time per key.
pub trait Loader: Send + Sync {
    /// Returns the bytes for `key`.
    fn load(&self, key: &str) -> Result<Vec<u8>, BoxError>;
}

/// Adapter turning a closure into a [`Loader`].
///
/// # Examples
///
/// ```
/// use peercache::{loader_fn, Loader};
///
/// let loader = loader_fn(|key: &str| Ok(key.as_bytes().to_vec()));
/// assert_eq!(loader.load("Tom").unwrap(), b"Tom");
/// ```
#[derive(Clone, Copy)]
pub struct LoaderFn<F>(pub F);

/// Wraps `f` as a [`Loader`].
pub fn loader_fn<F>(f: F) -> LoaderFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
    LoaderFn(f)
}

impl<F> Loader for LoaderFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
    fn load(&self, key: &str) -> Result<Vec<u8>, BoxError> {
        (self.0)(key)
    }
}

impl<F> fmt::Debug for LoaderFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoaderFn")
    }
}

/// Fetches a key of a named group from one remote peer.
pub trait PeerGetter: Send + Sync {
    /// Returns the bytes `group` holds for `key` on that peer.
    fn get(&self, group: &str, key: &str) -> Result<Vec<u8>, BoxError>;
}

/// Locates the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the remote owner of `key`, or `None` when this process should
    /// serve it itself.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// Picker for a process running without peers: every key is served locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPeers;

impl PeerPicker for NoPeers {
    fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
        None
    }
}

struct PickerState {
    ring: HashRing,
    getters: HashMap<String, Arc<dyn PeerGetter>>,
}

/// Picks peers with a consistent-hash ring.
///
/// The ring is rebuilt from scratch on every [`set_peers`](Self::set_peers),
/// which is how membership changes reach the picker. Keys routed to
/// `self_id` are served locally.
///
/// # Examples
///
/// ```
/// use peercache::{PeerGetter, PeerPicker, RingPeerPicker};
/// use std::sync::Arc;
///
/// struct Echo;
/// impl PeerGetter for Echo {
///     fn get(&self, _group: &str, key: &str) -> Result<Vec<u8>, peercache::BoxError> {
///         Ok(key.as_bytes().to_vec())
///     }
/// }
///
/// let picker = RingPeerPicker::new("node-a");
/// let echo: Arc<dyn PeerGetter> = Arc::new(Echo);
/// picker.set_peers([("node-b".to_string(), echo)]);
///
/// for key in ["Tom", "Jack", "Sam"] {
///     let remote = picker.pick_peer(key).is_some();
///     assert_eq!(remote, picker.owner(key).as_deref() == Some("node-b"));
/// }
/// ```
pub struct RingPeerPicker {
    self_id: String,
    config: HashRingConfig,
    hash: HashFn,
    state: RwLock<PickerState>,
}

impl RingPeerPicker {
    /// Creates a picker for the process identified by `self_id`, with the
    /// default replica count and CRC-32.
    pub fn new(self_id: impl Into<String>) -> Self {
        Self::init(self_id, HashRingConfig::default(), None)
    }

    /// Creates a picker with an explicit ring configuration and optional hash
    /// function.
    pub fn init(self_id: impl Into<String>, config: HashRingConfig, hash: Option<HashFn>) -> Self {
        let hash = hash.unwrap_or(crc32);
        let self_id = self_id.into();
        let mut ring = HashRing::init(config, Some(hash));
        ring.add([self_id.as_str()]);
        RingPeerPicker {
            self_id,
            config,
            hash,
            state: RwLock::new(PickerState {
                ring,
                getters: HashMap::new(),
            }),
        }
    }

    /// Identifier of the local process.
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Replaces the peer set.
    ///
    /// `peers` lists every *other* process with the getter that reaches it;
    /// an entry for `self_id` is ignored. The local process always stays on
    /// the ring.
    pub fn set_peers<I>(&self, peers: I)
    where
        I: IntoIterator<Item = (String, Arc<dyn PeerGetter>)>,
    {
        let mut ring = HashRing::init(self.config, Some(self.hash));
        let mut getters = HashMap::new();
        ring.add([self.self_id.as_str()]);
        for (id, getter) in peers {
            if id == self.self_id {
                continue;
            }
            ring.add([id.as_str()]);
            getters.insert(id, getter);
        }
        debug!(
            self_id = %self.self_id,
            peers = getters.len(),
            "peer set updated"
        );
        *self.state.write() = PickerState { ring, getters };
    }

    /// Identifier of the process that owns `key`.
    pub fn owner(&self, key: &str) -> Option<String> {
        self.state.read().ring.get(key).map(String::from)
    }

    /// Identifiers of the remote peers, sorted.
    pub fn peers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.read().getters.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}

impl PeerPicker for RingPeerPicker {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.read();
        let owner = state.ring.get(key)?;
        if owner == self.self_id {
            return None;
        }
        debug!(self_id = %self.self_id, peer = owner, key, "picked peer");
        state.getters.get(owner).cloned()
    }
}

impl fmt::Debug for RingPeerPicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingPeerPicker")
            .field("self_id", &self.self_id)
            .field("replicas", &self.config.replicas)
            .field("peers", &self.peers())
            .finish()
    }
}

/// A [`PeerGetter`] that reaches another registry in the same process.
///
/// The request is served by calling `get` on the target registry's group,
/// exactly as a network handler on the remote side would.
#[derive(Clone)]
pub struct LocalPeer {
    id: String,
    registry: Arc<GroupRegistry>,
}

impl LocalPeer {
    /// Creates a getter named `id` serving from `registry`.
    pub fn new(id: impl Into<String>, registry: Arc<GroupRegistry>) -> Self {
        LocalPeer {
            id: id.into(),
            registry,
        }
    }

    /// Identifier of the peer this getter reaches.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl PeerGetter for LocalPeer {
    fn get(&self, group: &str, key: &str) -> Result<Vec<u8>, BoxError> {
        let target = self
            .registry
            .get_group(group)
            .ok_or_else(|| Error::GroupNotFound(group.into()))?;
        match target.get(key) {
            Ok(view) => Ok(view.to_vec()),
            Err(err) => Err(Error::peer(self.id.as_str(), err.into()).into()),
        }
    }
}

impl fmt::Debug for LocalPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalPeer").field("id", &self.id).finish()
    }
}
