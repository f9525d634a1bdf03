//! SEARCH operations for BPlusTree.
//!
//! Every node a search touches counts as one access in the tree's
//! [`IndexStats`](super::IndexStats): each internal node on the way down,
//! the leaf at the bottom, and every further leaf a range scan enters.

use std::ops::{Bound, RangeBounds};

use crate::common::RecordRef;

use super::{BPlusTree, Key, Node, NodeId};

impl BPlusTree {
    /// Records stored under `key`, in insertion order.
    pub fn search(&self, key: Key) -> Option<&[RecordRef]> {
        let leaf = self.search_leaf(key)?;
        self.leaf_ref(leaf).get(key).map(Vec::as_slice)
    }

    /// Leaf that holds `key`, or would hold it if it were present.
    ///
    /// Range scans start here and follow the forward links.
    pub fn search_leaf(&self, key: Key) -> Option<NodeId> {
        self.search_path(key).last().copied()
    }

    /// Nodes visited while descending to the leaf for `key`, root first.
    ///
    /// At each internal node the descent follows the child after the last
    /// key `<= key`.
    pub fn search_path(&self, key: Key) -> Vec<NodeId> {
        let Some(mut id) = self.root else {
            return Vec::new();
        };

        let mut path = vec![id];
        while let Node::Internal(internal) = &self.arena[id] {
            id = internal.children[internal.child_index(key)];
            path.push(id);
        }

        self.stats.add_accesses(path.len() as u64);
        path
    }

    /// Iterate `(key, bucket)` pairs whose key lies in `range`, ascending.
    ///
    /// # Example
    /// ```
    /// use blockdb::{BPlusTree, DiskStore, Record, StorageConfig};
    ///
    /// let mut store = DiskStore::new(StorageConfig::new(64, 1024)).unwrap();
    /// let mut tree = BPlusTree::with_max_keys(3).unwrap();
    /// for votes in [5, 1, 9, 3, 7] {
    ///     let record = Record::new("tt", 50, votes).unwrap();
    ///     tree.insert(votes, store.insert(&record).unwrap());
    /// }
    ///
    /// let keys: Vec<i32> = tree.range(3..=7).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![3, 5, 7]);
    /// ```
    pub fn range<R: RangeBounds<Key>>(&self, range: R) -> RangeIter<'_> {
        let end = range.end_bound().cloned();

        let (leaf, idx) = match range.start_bound() {
            Bound::Included(&start) => match self.search_leaf(start) {
                Some(id) => (Some(id), self.leaf_ref(id).keys.partition_point(|&k| k < start)),
                None => (None, 0),
            },
            Bound::Excluded(&start) => match self.search_leaf(start) {
                Some(id) => (Some(id), self.leaf_ref(id).keys.partition_point(|&k| k <= start)),
                None => (None, 0),
            },
            Bound::Unbounded => {
                self.stats.add_accesses(self.height() as u64);
                (self.first_leaf(), 0)
            }
        };

        RangeIter {
            tree: self,
            leaf,
            idx,
            end,
        }
    }

    /// Iterate every `(key, bucket)` pair in key order.
    pub fn iter(&self) -> RangeIter<'_> {
        self.range(..)
    }
}

/// Iterator over a key range, walking the leaf chain.
///
/// Created by [`BPlusTree::range`] and [`BPlusTree::iter`].
pub struct RangeIter<'a> {
    tree: &'a BPlusTree,
    leaf: Option<NodeId>,
    idx: usize,
    end: Bound<Key>,
}

impl<'a> RangeIter<'a> {
    /// Leaf the iterator is positioned in; `None` once exhausted.
    pub fn current_leaf(&self) -> Option<NodeId> {
        self.leaf
    }

    fn past_end(&self, key: Key) -> bool {
        match self.end {
            Bound::Included(end) => key > end,
            Bound::Excluded(end) => key >= end,
            Bound::Unbounded => false,
        }
    }
}

impl<'a> Iterator for RangeIter<'a> {
    type Item = (Key, &'a [RecordRef]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.leaf?;
            let tree: &'a BPlusTree = self.tree;
            let leaf = tree.leaf_ref(id);

            if self.idx < leaf.keys.len() {
                let key = leaf.keys[self.idx];
                if self.past_end(key) {
                    self.leaf = None;
                    return None;
                }
                let bucket = leaf.buckets[self.idx].as_slice();
                self.idx += 1;
                return Some((key, bucket));
            }

            self.leaf = leaf.next;
            self.idx = 0;
            if self.leaf.is_some() {
                tree.stats.add_accesses(1);
            }
        }
    }
}
