//! Index statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by a [`BPlusTree`](super::BPlusTree).
///
/// Lookups take `&self`, so the counters are atomics. The tree is
/// single-threaded; `Ordering::Relaxed` only buys interior mutability.
///
/// # Example
/// ```
/// use blockdb::IndexStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = IndexStats::new();
/// stats.node_accesses.fetch_add(3, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().node_accesses, 3);
/// ```
#[derive(Debug)]
pub struct IndexStats {
    /// Nodes visited by searches and range scans.
    pub node_accesses: AtomicU64,

    /// Leaf nodes split on insert.
    pub leaf_splits: AtomicU64,

    /// Internal nodes split on insert.
    pub internal_splits: AtomicU64,

    /// Entries moved from a sibling to fix an underfull node.
    pub borrows: AtomicU64,

    /// Node pairs merged into one.
    pub merges: AtomicU64,

    /// Times the root was replaced by its only child.
    pub root_collapses: AtomicU64,
}

impl IndexStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            node_accesses: AtomicU64::new(0),
            leaf_splits: AtomicU64::new(0),
            internal_splits: AtomicU64::new(0),
            borrows: AtomicU64::new(0),
            merges: AtomicU64::new(0),
            root_collapses: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_accesses(&self, n: u64) {
        self.node_accesses.fetch_add(n, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> IndexStatsSnapshot {
        IndexStatsSnapshot {
            node_accesses: self.node_accesses.load(Ordering::Relaxed),
            leaf_splits: self.leaf_splits.load(Ordering::Relaxed),
            internal_splits: self.internal_splits.load(Ordering::Relaxed),
            borrows: self.borrows.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            root_collapses: self.root_collapses.load(Ordering::Relaxed),
        }
    }

    /// Reset only the access counter, leaving structural counters intact.
    pub fn reset_accesses(&self) {
        self.node_accesses.store(0, Ordering::Relaxed);
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.node_accesses.store(0, Ordering::Relaxed);
        self.leaf_splits.store(0, Ordering::Relaxed);
        self.internal_splits.store(0, Ordering::Relaxed);
        self.borrows.store(0, Ordering::Relaxed);
        self.merges.store(0, Ordering::Relaxed);
        self.root_collapses.store(0, Ordering::Relaxed);
    }
}

impl Default for IndexStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`IndexStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStatsSnapshot {
    pub node_accesses: u64,
    pub leaf_splits: u64,
    pub internal_splits: u64,
    pub borrows: u64,
    pub merges: u64,
    pub root_collapses: u64,
}

impl fmt::Display for IndexStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IndexStats {{ accesses: {}, splits: {}/{}, borrows: {}, merges: {}, collapses: {} }}",
            self.node_accesses,
            self.leaf_splits,
            self.internal_splits,
            self.borrows,
            self.merges,
            self.root_collapses
        )
    }
}
