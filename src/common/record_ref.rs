//! Record reference type.

use std::fmt;

/// Back-reference to a record stored in a [`DiskStore`](crate::storage::DiskStore).
///
/// Holds the record's byte offset into the store's arena. It owns nothing:
/// the store stays the sole owner of the bytes, and only the store can turn
/// a reference back into a block id or a [`Record`](crate::storage::Record).
///
/// References are handed out by `DiskStore::insert` and are the payload the
/// index keeps in its buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef(usize);

impl RecordRef {
    /// Create a reference to the record starting at `offset`.
    #[inline]
    pub(crate) fn new(offset: usize) -> Self {
        RecordRef(offset)
    }

    /// Byte offset of the record within the arena.
    #[inline]
    pub fn offset(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record(@{})", self.0)
    }
}
