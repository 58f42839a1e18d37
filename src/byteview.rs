//! Immutable byte views handed out by cache groups.

extern crate alloc;

use crate::lru::ByteSize;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

/// An immutable view of a cached value.
///
/// A `ByteView` owns its bytes: building one from a borrowed slice copies it,
/// and building one from a `Vec<u8>` takes the vector over. Nothing the
/// caller holds afterwards can reach the storage, and the view itself offers
/// no mutation, so the same allocation is shared by the cache and every
/// reader. Cloning bumps a reference count.
///
/// # Examples
///
/// ```
/// use peercache::ByteView;
///
/// let mut source = b"630".to_vec();
/// let view = ByteView::copy_from_slice(&source);
/// source[0] = b'9';
///
/// assert_eq!(view.as_slice(), b"630");
/// assert_eq!(view.len(), 3);
/// assert_eq!(view.to_string(), "630");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteView {
    bytes: Arc<[u8]>,
}

impl ByteView {
    /// Creates a view holding a private copy of `bytes`.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        ByteView {
            bytes: Arc::from(bytes),
        }
    }

    /// Number of bytes in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-length view.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read-only access to the bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Read-only access to a sub-range of the bytes.
    ///
    /// Returns `None` when the range falls outside the view.
    pub fn slice(&self, range: Range<usize>) -> Option<&[u8]> {
        self.bytes.get(range)
    }

    /// Returns the byte at `index`, if any.
    #[inline]
    pub fn at(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Copies the bytes into a new vector the caller may mutate freely.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Decodes the bytes as UTF-8, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        ByteView {
            bytes: Arc::from(bytes),
        }
    }
}

impl From<&[u8]> for ByteView {
    fn from(bytes: &[u8]) -> Self {
        ByteView::copy_from_slice(bytes)
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        ByteView::copy_from_slice(s.as_bytes())
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl ByteSize for ByteView {
    #[inline]
    fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("len", &self.bytes.len())
            .field("bytes", &String::from_utf8_lossy(&self.bytes))
            .finish()
    }
}
