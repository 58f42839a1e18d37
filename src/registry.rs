//! Name → group lookup.
//!
//! A process typically owns one [`GroupRegistry`]. Transport handlers (and
//! [`LocalPeer`](crate::LocalPeer)) resolve the group named in an incoming
//! request through it.

extern crate alloc;

use crate::config::GroupConfig;
use crate::group::Group;
use crate::peers::Loader;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use parking_lot::RwLock;
use tracing::{debug, warn};

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Registry of the cache groups living in one process.
///
/// Lookups take a shared lock; creating a group takes the exclusive one.
///
/// # Examples
///
/// ```
/// use peercache::{loader_fn, GroupRegistry};
///
/// let registry = GroupRegistry::new();
/// registry.new_group("scores", 2 << 10, loader_fn(|key: &str| Ok(key.as_bytes().to_vec())));
///
/// let scores = registry.get_group("scores").unwrap();
/// assert_eq!(scores.get("Tom").unwrap().as_slice(), b"Tom");
/// assert!(registry.get_group("missing").is_none());
/// ```
#[derive(Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a group and registers it under `name`.
    ///
    /// Registering a name twice replaces the earlier group; holders of the old
    /// `Arc<Group>` keep a working, but unreachable, group.
    pub fn new_group(
        &self,
        name: impl Into<String>,
        max_bytes: u64,
        loader: impl Loader + 'static,
    ) -> Arc<Group> {
        let config = GroupConfig {
            name: name.into(),
            max_bytes,
        };
        self.new_group_with_config(config, Arc::new(loader))
    }

    /// Creates and registers a group from a full configuration.
    pub fn new_group_with_config(
        &self,
        config: GroupConfig,
        loader: Arc<dyn Loader>,
    ) -> Arc<Group> {
        let name = config.name.clone();
        let max_bytes = config.max_bytes;
        let group = Arc::new(Group::new(config, loader));

        let replaced = self
            .groups
            .write()
            .insert(name.clone(), Arc::clone(&group));
        if replaced.is_some() {
            warn!(group = %name, "group name already registered, replacing");
        } else {
            debug!(group = %name, max_bytes, "group created");
        }
        group
    }

    /// Returns the group registered under `name`.
    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    /// Returns `true` when no group is registered.
    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl fmt::Debug for GroupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRegistry")
            .field("groups", &self.names())
            .finish()
    }
}
