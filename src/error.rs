//! Error types returned by cache groups and their collaborators.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;

/// Boxed error returned by user-supplied collaborators ([`Loader`](crate::Loader),
/// [`PeerGetter`](crate::PeerGetter)).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A collaborator error shared between every caller coalesced on one fetch.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors surfaced by [`Group::get`](crate::Group::get) and the in-process
/// transport.
///
/// `Error` is cheap to clone: a failed fetch is handed, unchanged, to every
/// caller that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The request itself is malformed (e.g. an empty key). Never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The group's loader failed. Not cached: the next call retries it.
    #[error("loader failed: {0}")]
    Loader(#[source] SharedError),

    /// A remote peer failed to serve a key.
    ///
    /// Groups recover from this by loading locally, so it only reaches a
    /// caller through a [`PeerGetter`](crate::PeerGetter) used directly.
    #[error("peer {peer} failed: {source}")]
    Peer {
        /// Identifier of the peer that failed.
        peer: String,
        /// Underlying failure.
        #[source]
        source: SharedError,
    },

    /// The named group is not registered.
    #[error("no such group: {0}")]
    GroupNotFound(String),
}

impl Error {
    /// Wraps a loader failure.
    pub fn loader(err: BoxError) -> Self {
        Error::Loader(Arc::from(err))
    }

    /// Wraps a failure reported by `peer`.
    pub fn peer(peer: impl Into<String>, err: BoxError) -> Self {
        Error::Peer {
            peer: peer.into(),
            source: Arc::from(err),
        }
    }

    /// Returns `true` for [`Error::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Returns `true` for [`Error::Loader`].
    pub fn is_loader(&self) -> bool {
        matches!(self, Error::Loader(_))
    }
}
