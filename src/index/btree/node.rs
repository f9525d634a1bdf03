//! B+ tree node types.
//!
//! A [`Node`] is either a [`LeafNode`] (keys with their record buckets and a
//! link to the next leaf) or an [`InternalNode`] (separator keys and child
//! ids). Nodes refer to each other by [`NodeId`]; the tree's arena owns them.

use std::fmt;

use crate::common::RecordRef;

/// Index key: the vote count of a record.
pub type Key = i32;

/// Records sharing one key, in arrival order.
pub type Bucket = Vec<RecordRef>;

/// Identifies a node slot in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Leaf node: sorted unique keys, one bucket per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafNode {
    pub(crate) keys: Vec<Key>,
    pub(crate) buckets: Vec<Bucket>,
    /// Next leaf in key order. Non-owning.
    pub(crate) next: Option<NodeId>,
}

impl LeafNode {
    /// Leaf holding a single key.
    pub(crate) fn with_entry(key: Key, record_ref: RecordRef) -> Self {
        Self {
            keys: vec![key],
            buckets: vec![vec![record_ref]],
            next: None,
        }
    }

    /// Keys in ascending order.
    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Buckets parallel to [`keys`](Self::keys).
    #[inline]
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// The following leaf, if any.
    #[inline]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Position of `key`, or where it would be inserted.
    #[inline]
    pub(crate) fn find(&self, key: Key) -> std::result::Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    /// Bucket stored under `key`.
    pub fn get(&self, key: Key) -> Option<&Bucket> {
        self.find(key).ok().map(|idx| &self.buckets[idx])
    }

    pub(crate) fn insert_at(&mut self, idx: usize, key: Key, bucket: Bucket) {
        self.keys.insert(idx, key);
        self.buckets.insert(idx, bucket);
    }

    pub(crate) fn remove_at(&mut self, idx: usize) -> (Key, Bucket) {
        (self.keys.remove(idx), self.buckets.remove(idx))
    }

    /// Split off everything after the first `keep` entries into a new leaf.
    ///
    /// The new leaf takes over this leaf's forward link; the caller links
    /// this leaf to the new one once it has an id.
    pub(crate) fn split_off(&mut self, keep: usize) -> LeafNode {
        LeafNode {
            keys: self.keys.split_off(keep),
            buckets: self.buckets.split_off(keep),
            next: self.next.take(),
        }
    }

    /// Append all entries of `right` and take over its forward link.
    pub(crate) fn absorb(&mut self, right: LeafNode) {
        self.keys.extend(right.keys);
        self.buckets.extend(right.buckets);
        self.next = right.next;
    }
}

/// Internal node: `m` separator keys and `m + 1` children.
///
/// Every key in `children[i]` is `< keys[i]`, and every key in
/// `children[i + 1]` is `>= keys[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternalNode {
    pub(crate) keys: Vec<Key>,
    pub(crate) children: Vec<NodeId>,
}

impl InternalNode {
    /// Keys in ascending order.
    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Child ids, one more than the number of keys.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index of the child to follow for `key`: the first key strictly
    /// greater than `key`.
    #[inline]
    pub fn child_index(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k <= key)
    }

    /// Insert `key` at its sorted position with `child` right after it.
    pub(crate) fn insert_separator(&mut self, key: Key, child: NodeId) -> usize {
        let idx = self.child_index(key);
        self.keys.insert(idx, key);
        self.children.insert(idx + 1, child);
        idx
    }

    /// Split a node holding one key too many.
    ///
    /// The median key moves up and belongs to neither half. This node keeps
    /// `keys[..mid]` and `children[..=mid]`; the returned node gets the rest.
    pub(crate) fn split(&mut self) -> (Key, InternalNode) {
        let mid = self.keys.len() / 2;
        let right_keys = self.keys.split_off(mid + 1);
        let right_children = self.children.split_off(mid + 1);
        let median = self.keys.pop().unwrap_or_default();

        (
            median,
            InternalNode {
                keys: right_keys,
                children: right_children,
            },
        )
    }
}

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    /// Keys held by this node.
    pub fn keys(&self) -> &[Key] {
        match self {
            Node::Leaf(leaf) => leaf.keys(),
            Node::Internal(internal) => internal.keys(),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    pub fn as_internal(&self) -> Option<&InternalNode> {
        match self {
            Node::Internal(internal) => Some(internal),
            Node::Leaf(_) => None,
        }
    }
}

/// Renders the keys as `{k1, k2, ...}`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, key) in self.keys().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", key)?;
        }
        write!(f, "}}")
    }
}
