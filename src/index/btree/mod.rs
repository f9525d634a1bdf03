//! B+ tree index keyed on vote counts.
//!
//! # Structure
//! ```text
//!                  ┌────────────┐
//!                  │  {40, 80}  │            internal: m keys, m + 1 children
//!                  └─┬───┬────┬─┘
//!          ┌─────────┘   │    └──────────┐
//!   ┌──────┴─────┐ ┌─────┴──────┐ ┌──────┴─────┐
//!   │ {10,20,30} │→│ {40,50,60} │→│ {80,90}    │→ None
//!   └────────────┘ └────────────┘ └────────────┘
//!     leaves: one bucket of record references per key, linked left to right
//! ```
//!
//! All nodes live in an arena owned by the [`BPlusTree`]; parents refer to
//! children by [`NodeId`] and leaves refer to their successor the same way.
//! Nodes carry no parent pointer. Insert and remove record the descent path
//! instead, and [`BPlusTree::parent_of`] searches from the root when a parent
//! is needed outside of those operations.
//!
//! # Capacity
//! A node fits one block. With block size `b`, pointer size 8 and key size 4,
//! `n = (b - 8) / 12` keys per node and `n + 1` children per internal node.
//!
//! Operations are split by concern:
//! - [`search`] - point lookup, leaf lookup, range scans
//! - [`insert`] - insertion with leaf and internal splits
//! - [`delete`] - removal with borrowing and merging
//! - [`validation`] - explicit invariant checks

mod arena;
pub mod delete;
pub mod insert;
mod node;
pub mod search;
mod stats;
pub mod validation;

use std::collections::VecDeque;

use log::info;

use crate::common::config::{branching_factor, MIN_BRANCHING_FACTOR};
use crate::common::{Error, Result};

use arena::NodeArena;
pub use node::{Bucket, InternalNode, Key, LeafNode, Node, NodeId};
pub use search::RangeIter;
pub use stats::{IndexStats, IndexStatsSnapshot};

/// One step of a root-to-leaf descent: an internal node and the index of
/// the child that was followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathStep {
    pub(crate) node: NodeId,
    pub(crate) child_idx: usize,
}

/// A B+ tree mapping each key to a bucket of record references.
///
/// # Example
/// ```
/// use blockdb::{BPlusTree, DiskStore, Record, StorageConfig};
///
/// let mut store = DiskStore::new(StorageConfig::new(500, 5000)).unwrap();
/// let mut tree = BPlusTree::new(500).unwrap();
///
/// let record = Record::new("tt0000001", 57, 1645).unwrap();
/// let record_ref = store.insert(&record).unwrap();
/// tree.insert(record.num_votes(), record_ref);
///
/// assert_eq!(tree.search(1645), Some(&[record_ref][..]));
/// assert_eq!(tree.search(1), None);
/// ```
#[derive(Debug)]
pub struct BPlusTree {
    arena: NodeArena,
    root: Option<NodeId>,
    /// Branching factor `n`.
    max_keys: usize,
    max_children: usize,
    key_count: usize,
    record_count: usize,
    stats: IndexStats,
}

impl BPlusTree {
    /// Create an empty tree whose nodes fit in `block_size` bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the block is too small for two keys.
    pub fn new(block_size: usize) -> Result<Self> {
        let tree = Self::with_max_keys(branching_factor(block_size)).map_err(|_| {
            Error::InvalidConfig(format!(
                "block size {} gives {} keys per node (minimum {})",
                block_size,
                branching_factor(block_size),
                MIN_BRANCHING_FACTOR
            ))
        })?;

        info!(
            "b+ tree: {}-byte nodes, n = {}, {} children per internal node",
            block_size, tree.max_keys, tree.max_children
        );
        Ok(tree)
    }

    /// Create an empty tree with an explicit branching factor.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if `max_keys` is below 2.
    pub fn with_max_keys(max_keys: usize) -> Result<Self> {
        if max_keys < MIN_BRANCHING_FACTOR {
            return Err(Error::InvalidConfig(format!(
                "{} keys per node (minimum {})",
                max_keys, MIN_BRANCHING_FACTOR
            )));
        }

        Ok(Self {
            arena: NodeArena::new(),
            root: None,
            max_keys,
            max_children: max_keys + 1,
            key_count: 0,
            record_count: 0,
            stats: IndexStats::new(),
        })
    }

    // ========================================================================
    // Capacity
    // ========================================================================

    /// Branching factor `n`: maximum keys in any node.
    #[inline]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Maximum children of an internal node.
    #[inline]
    pub fn max_children(&self) -> usize {
        self.max_children
    }

    /// Fewest keys a non-root leaf may hold.
    #[inline]
    pub fn min_leaf_keys(&self) -> usize {
        (self.max_keys + 1) / 2
    }

    /// Fewest keys a non-root internal node may hold.
    #[inline]
    pub fn min_internal_keys(&self) -> usize {
        (self.max_children + 1) / 2 - 1
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.key_count
    }

    /// Number of record references across all buckets.
    #[inline]
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    #[inline]
    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.map(|id| &self.arena[id])
    }

    /// Look up a node by id; `None` for ids that are not live.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Look up a leaf by id; `None` for internal nodes and dead ids.
    pub fn leaf(&self, id: NodeId) -> Option<&LeafNode> {
        self.arena.get(id).and_then(Node::as_leaf)
    }

    /// Number of nodes reachable from the root, counted breadth first.
    pub fn node_count(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };

        let mut count = 0;
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            count += 1;
            if let Node::Internal(internal) = &self.arena[id] {
                queue.extend(internal.children.iter().copied());
            }
        }
        count
    }

    /// Number of levels, leaves included; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(id) = current {
            height += 1;
            current = match &self.arena[id] {
                Node::Internal(internal) => internal.children.first().copied(),
                Node::Leaf(_) => None,
            };
        }
        height
    }

    /// Leftmost leaf, the head of the forward-link chain.
    pub fn first_leaf(&self) -> Option<NodeId> {
        let mut id = self.root?;
        while let Node::Internal(internal) = &self.arena[id] {
            id = *internal.children.first()?;
        }
        Some(id)
    }

    /// Find the parent of `child` by searching down from the root.
    ///
    /// Depth first, stopping at the first internal node that lists `child`.
    /// Returns `None` for the root and for ids not in the tree.
    pub fn parent_of(&self, child: NodeId) -> Option<NodeId> {
        let root = self.root?;
        if root == child {
            return None;
        }
        self.find_parent(root, child)
    }

    fn find_parent(&self, current: NodeId, child: NodeId) -> Option<NodeId> {
        let Node::Internal(internal) = &self.arena[current] else {
            return None;
        };
        if internal.children.contains(&child) {
            return Some(current);
        }
        internal
            .children
            .iter()
            .find_map(|&grandchild| self.find_parent(grandchild, child))
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Nodes visited by searches since the last reset.
    #[inline]
    pub fn node_accesses(&self) -> u64 {
        self.stats.snapshot().node_accesses
    }

    pub fn reset_node_accesses(&self) {
        self.stats.reset_accesses();
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Drop every node, keeping the branching factor.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.key_count = 0;
        self.record_count = 0;
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Descend to the leaf responsible for `key`, recording the path.
    pub(crate) fn descend(&self, key: Key) -> Option<(Vec<PathStep>, NodeId)> {
        let mut id = self.root?;
        let mut path = Vec::new();
        while let Node::Internal(internal) = &self.arena[id] {
            let child_idx = internal.child_index(key);
            path.push(PathStep {
                node: id,
                child_idx,
            });
            id = internal.children[child_idx];
        }
        Some((path, id))
    }

    pub(crate) fn leaf_ref(&self, id: NodeId) -> &LeafNode {
        match &self.arena[id] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("{} is not a leaf", id),
        }
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode {
        match &mut self.arena[id] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("{} is not a leaf", id),
        }
    }

    pub(crate) fn internal_ref(&self, id: NodeId) -> &InternalNode {
        match &self.arena[id] {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => unreachable!("{} is not an internal node", id),
        }
    }

    pub(crate) fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode {
        match &mut self.arena[id] {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => unreachable!("{} is not an internal node", id),
        }
    }
}
