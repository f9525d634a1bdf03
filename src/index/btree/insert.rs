//! INSERT operations for BPlusTree.
//!
//! Insertion walks down once, recording the path. A full leaf splits and
//! pushes its right half's first key into the parent; a full parent splits
//! in turn, promoting its median, until a node has room or a new root is
//! created.

use log::debug;

use crate::common::RecordRef;

use super::{BPlusTree, IndexStats, InternalNode, Key, LeafNode, Node, NodeId, PathStep};

impl BPlusTree {
    /// Add `record_ref` under `key`.
    ///
    /// A key that is already present only grows its bucket; the tree shape
    /// does not change.
    pub fn insert(&mut self, key: Key, record_ref: RecordRef) {
        let Some((path, leaf_id)) = self.descend(key) else {
            let root = self
                .arena
                .allocate(Node::Leaf(LeafNode::with_entry(key, record_ref)));
            self.root = Some(root);
            self.key_count = 1;
            self.record_count = 1;
            return;
        };

        self.record_count += 1;
        let max_keys = self.max_keys;
        let leaf = self.leaf_mut(leaf_id);

        let idx = match leaf.find(key) {
            Ok(idx) => {
                leaf.buckets[idx].push(record_ref);
                return;
            }
            Err(idx) => idx,
        };

        leaf.insert_at(idx, key, vec![record_ref]);
        self.key_count += 1;

        if self.leaf_ref(leaf_id).len() > max_keys {
            self.split_leaf(path, leaf_id);
        }
    }

    /// Split a leaf holding `n + 1` entries.
    ///
    /// The left leaf keeps the first `n / 2 + 1` entries; the new right leaf
    /// takes the rest and slots into the forward-link chain after it.
    fn split_leaf(&mut self, path: Vec<PathStep>, leaf_id: NodeId) {
        let keep = self.max_keys / 2 + 1;
        let right = self.leaf_mut(leaf_id).split_off(keep);
        let separator = right.keys[0];

        let right_id = self.arena.allocate(Node::Leaf(right));
        self.leaf_mut(leaf_id).next = Some(right_id);
        IndexStats::bump(&self.stats.leaf_splits);
        debug!(
            "split leaf {} at key {} into {}",
            leaf_id, separator, right_id
        );

        self.insert_internal(path, leaf_id, separator, right_id);
    }

    /// Register `right` as the sibling after `left`, separated by `key`.
    ///
    /// `path` leads from the root to `left`'s parent. When the path runs out
    /// `left` was the root, and a new root is created above both.
    fn insert_internal(
        &mut self,
        mut path: Vec<PathStep>,
        mut left: NodeId,
        mut key: Key,
        mut right: NodeId,
    ) {
        let max_keys = self.max_children - 1;

        while let Some(step) = path.pop() {
            let parent = self.internal_mut(step.node);
            let idx = parent.insert_separator(key, right);
            debug_assert_eq!(idx, step.child_idx, "separator landed beside the wrong child");

            if parent.len() <= max_keys {
                return;
            }

            let (median, sibling) = parent.split();
            let sibling_id = self.arena.allocate(Node::Internal(sibling));
            IndexStats::bump(&self.stats.internal_splits);
            debug!(
                "split internal {} promoting {} into {}",
                step.node, median, sibling_id
            );

            left = step.node;
            key = median;
            right = sibling_id;
        }

        let root = self.arena.allocate(Node::Internal(InternalNode {
            keys: vec![key],
            children: vec![left, right],
        }));
        self.root = Some(root);
        debug!("new root {} with key {}, height {}", root, key, self.height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rref(i: usize) -> RecordRef {
        RecordRef::new(i * 16)
    }

    fn leaf_keys(tree: &BPlusTree) -> Vec<Vec<Key>> {
        let mut leaves = Vec::new();
        let mut current = tree.first_leaf();
        while let Some(id) = current {
            let leaf = tree.leaf(id).unwrap();
            leaves.push(leaf.keys().to_vec());
            current = leaf.next();
        }
        leaves
    }

    #[test]
    fn test_insert_into_empty_tree() {
        let mut tree = BPlusTree::with_max_keys(3).unwrap();
        tree.insert(10, rref(1));

        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.root().unwrap().is_leaf());
        assert_eq!(tree.search(10), Some(&[rref(1)][..]));
    }

    #[test]
    fn test_duplicate_keys_share_bucket() {
        let mut tree = BPlusTree::with_max_keys(3).unwrap();
        tree.insert(500, rref(1));
        tree.insert(500, rref(2));
        tree.insert(500, rref(3));

        assert_eq!(tree.search(500), Some(&[rref(1), rref(2), rref(3)][..]));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.record_count(), 3);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_insert_keeps_leaf_sorted() {
        let mut tree = BPlusTree::with_max_keys(5).unwrap();
        for key in [30, 10, 50, 20, 40] {
            tree.insert(key, rref(key as usize));
        }
        assert_eq!(tree.root().unwrap().keys(), &[10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_leaf_split_creates_root() {
        let mut tree = BPlusTree::with_max_keys(4).unwrap();
        for key in 1..=5 {
            tree.insert(key, rref(key as usize));
        }

        // n = 4: left keeps n / 2 + 1 = 3 entries
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2, 3], vec![4, 5]]);

        let root = tree.root().unwrap().as_internal().unwrap();
        assert_eq!(root.keys(), &[4]);
        assert_eq!(root.children().len(), 2);
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.stats().snapshot().leaf_splits, 1);
    }

    #[test]
    fn test_split_inserts_new_key_in_order() {
        let mut tree = BPlusTree::with_max_keys(4).unwrap();
        for key in [10, 20, 40, 50, 30] {
            tree.insert(key, rref(key as usize));
        }
        assert_eq!(leaf_keys(&tree), vec![vec![10, 20, 30], vec![40, 50]]);
    }

    #[test]
    fn test_split_links_between_neighbours() {
        let mut tree = BPlusTree::with_max_keys(3).unwrap();
        for key in [10, 20, 30, 40, 50, 60] {
            tree.insert(key, rref(key as usize));
        }
        // Split the first leaf again by filling its gap
        tree.insert(11, rref(11));
        tree.insert(12, rref(12));

        let flattened: Vec<Key> = leaf_keys(&tree).into_iter().flatten().collect();
        assert_eq!(flattened, vec![10, 11, 12, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_internal_split_grows_height() {
        let mut tree = BPlusTree::with_max_keys(2).unwrap();
        let mut heights = Vec::new();
        for key in 1..=30 {
            tree.insert(key, rref(key as usize));
            heights.push(tree.height());
        }

        assert!(tree.height() >= 4);
        assert!(tree.stats().snapshot().internal_splits > 0);
        // Height never jumps by more than one level per insert
        for pair in heights.windows(2) {
            assert!(pair[1] == pair[0] || pair[1] == pair[0] + 1);
        }
    }

    #[test]
    fn test_internal_split_excludes_median() {
        let mut tree = BPlusTree::with_max_keys(2).unwrap();
        for key in 1..=7 {
            tree.insert(key, rref(key as usize));
        }

        // Median keys live in exactly one internal node
        let root = tree.root().unwrap().as_internal().unwrap();
        for &child in root.children() {
            let child = tree.node(child).unwrap();
            for key in root.keys() {
                assert!(!child.keys().contains(key) || child.is_leaf());
            }
        }
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_descending_inserts() {
        let mut tree = BPlusTree::with_max_keys(3).unwrap();
        for key in (1..=100).rev() {
            tree.insert(key, rref(key as usize));
        }
        for key in 1..=100 {
            assert_eq!(tree.search(key), Some(&[rref(key as usize)][..]));
        }
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_node_count_matches_arena() {
        let mut tree = BPlusTree::with_max_keys(3).unwrap();
        for key in 0..500 {
            tree.insert((key * 7919) % 1000, rref(key as usize));
        }
        assert_eq!(tree.node_count(), tree.arena.len());
    }
}
