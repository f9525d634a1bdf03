//! DELETE operations for BPlusTree.
//!
//! Removing a key drops its whole bucket. A leaf left below minimum
//! occupancy is fixed in this order:
//! 1. borrow the largest entry of the left sibling
//! 2. borrow the smallest entry of the right sibling
//! 3. merge into the left sibling
//! 4. merge the right sibling into it
//!
//! A merge deletes a separator from the parent, which may leave the parent
//! underfull; internal nodes follow the same policy, rotating keys through
//! the parent separator instead of copying them. A root left with one child
//! is replaced by that child.

use log::debug;

use crate::common::RecordRef;

use super::{BPlusTree, IndexStats, Key, Node, NodeId, PathStep};

impl BPlusTree {
    /// Remove `key` and its whole bucket.
    ///
    /// Returns the removed bucket, or `None` if the tree is empty or the key
    /// is absent. Neither case is an error and neither changes the tree.
    pub fn remove(&mut self, key: Key) -> Option<Vec<RecordRef>> {
        let Some((path, leaf_id)) = self.descend(key) else {
            debug!("remove {}: nothing to remove, the tree is empty", key);
            return None;
        };

        let leaf = self.leaf_mut(leaf_id);
        let Ok(idx) = leaf.find(key) else {
            debug!("remove {}: key not found", key);
            return None;
        };

        let (_, bucket) = leaf.remove_at(idx);
        let remaining = leaf.len();
        self.key_count -= 1;
        self.record_count -= bucket.len();
        debug!("removed key {} with {} records", key, bucket.len());

        if path.is_empty() {
            if remaining == 0 {
                self.arena.free(leaf_id);
                self.root = None;
                debug!("tree is now empty");
            }
        } else if remaining < self.min_leaf_keys() {
            self.rebalance_leaf(path, leaf_id);
        }

        Some(bucket)
    }

    /// Restore minimum occupancy of a non-root leaf.
    fn rebalance_leaf(&mut self, path: Vec<PathStep>, leaf_id: NodeId) {
        let min_keys = self.min_leaf_keys();
        let Some(&PathStep {
            node: parent_id,
            child_idx: idx,
        }) = path.last()
        else {
            return;
        };

        let parent = self.internal_ref(parent_id);
        let left_id = idx.checked_sub(1).map(|i| parent.children[i]);
        let right_id = parent.children.get(idx + 1).copied();

        if let Some(left_id) = left_id {
            if self.leaf_ref(left_id).len() > min_keys {
                let left = self.leaf_mut(left_id);
                let (key, bucket) = left.remove_at(left.len() - 1);
                self.leaf_mut(leaf_id).insert_at(0, key, bucket);
                self.internal_mut(parent_id).keys[idx - 1] = key;
                IndexStats::bump(&self.stats.borrows);
                debug!("leaf {} borrowed {} from left sibling {}", leaf_id, key, left_id);
                return;
            }
        }

        if let Some(right_id) = right_id {
            if self.leaf_ref(right_id).len() > min_keys {
                let (key, bucket) = self.leaf_mut(right_id).remove_at(0);
                let leaf = self.leaf_mut(leaf_id);
                let at = leaf.len();
                leaf.insert_at(at, key, bucket);
                let new_first = self.leaf_ref(right_id).keys[0];
                self.internal_mut(parent_id).keys[idx] = new_first;
                IndexStats::bump(&self.stats.borrows);
                debug!("leaf {} borrowed {} from right sibling {}", leaf_id, key, right_id);
                return;
            }
        }

        match (left_id, right_id) {
            (Some(left_id), _) => {
                let Some(Node::Leaf(leaf)) = self.arena.free(leaf_id) else {
                    unreachable!("{} is not a leaf", leaf_id);
                };
                self.leaf_mut(left_id).absorb(leaf);
                IndexStats::bump(&self.stats.merges);
                debug!("merged leaf {} into left sibling {}", leaf_id, left_id);
                self.remove_internal(path, idx - 1, idx);
            }
            (None, Some(right_id)) => {
                let Some(Node::Leaf(right)) = self.arena.free(right_id) else {
                    unreachable!("{} is not a leaf", right_id);
                };
                self.leaf_mut(leaf_id).absorb(right);
                IndexStats::bump(&self.stats.merges);
                debug!("merged right sibling {} into leaf {}", right_id, leaf_id);
                self.remove_internal(path, idx, idx + 1);
            }
            (None, None) => unreachable!("non-root {} has no siblings", leaf_id),
        }
    }

    /// Drop `keys[key_idx]` and `children[child_idx]` from the last node on
    /// `path`, then fix that node's occupancy, walking up as merges cascade.
    fn remove_internal(&mut self, mut path: Vec<PathStep>, mut key_idx: usize, mut child_idx: usize) {
        let min_keys = self.min_internal_keys();

        while let Some(step) = path.pop() {
            let node_id = step.node;
            let node = self.internal_mut(node_id);
            node.keys.remove(key_idx);
            node.children.remove(child_idx);

            if path.is_empty() {
                // `node_id` is the root
                if node.children.len() == 1 {
                    let child = node.children[0];
                    self.arena.free(node_id);
                    self.root = Some(child);
                    IndexStats::bump(&self.stats.root_collapses);
                    debug!("root {} collapsed into {}, height {}", node_id, child, self.height());
                }
                return;
            }

            if node.len() >= min_keys {
                return;
            }

            let PathStep {
                node: parent_id,
                child_idx: idx,
            } = path[path.len() - 1];
            let parent = self.internal_ref(parent_id);
            let left_id = idx.checked_sub(1).map(|i| parent.children[i]);
            let right_id = parent.children.get(idx + 1).copied();

            if let Some(left_id) = left_id {
                if self.internal_ref(left_id).len() > min_keys {
                    let separator = self.internal_ref(parent_id).keys[idx - 1];
                    let left = self.internal_mut(left_id);
                    let (Some(key), Some(child)) = (left.keys.pop(), left.children.pop()) else {
                        unreachable!("left sibling {} is empty", left_id);
                    };
                    let node = self.internal_mut(node_id);
                    node.keys.insert(0, separator);
                    node.children.insert(0, child);
                    self.internal_mut(parent_id).keys[idx - 1] = key;
                    IndexStats::bump(&self.stats.borrows);
                    debug!("internal {} rotated {} in from left sibling {}", node_id, separator, left_id);
                    return;
                }
            }

            if let Some(right_id) = right_id {
                if self.internal_ref(right_id).len() > min_keys {
                    let separator = self.internal_ref(parent_id).keys[idx];
                    let right = self.internal_mut(right_id);
                    let key = right.keys.remove(0);
                    let child = right.children.remove(0);
                    let node = self.internal_mut(node_id);
                    node.keys.push(separator);
                    node.children.push(child);
                    self.internal_mut(parent_id).keys[idx] = key;
                    IndexStats::bump(&self.stats.borrows);
                    debug!("internal {} rotated {} in from right sibling {}", node_id, separator, right_id);
                    return;
                }
            }

            match (left_id, right_id) {
                (Some(left_id), _) => {
                    let separator = self.internal_ref(parent_id).keys[idx - 1];
                    let Some(Node::Internal(node)) = self.arena.free(node_id) else {
                        unreachable!("{} is not an internal node", node_id);
                    };
                    let left = self.internal_mut(left_id);
                    left.keys.push(separator);
                    left.keys.extend(node.keys);
                    left.children.extend(node.children);
                    IndexStats::bump(&self.stats.merges);
                    debug!("merged internal {} into left sibling {}", node_id, left_id);
                    key_idx = idx - 1;
                    child_idx = idx;
                }
                (None, Some(right_id)) => {
                    let separator = self.internal_ref(parent_id).keys[idx];
                    let Some(Node::Internal(right)) = self.arena.free(right_id) else {
                        unreachable!("{} is not an internal node", right_id);
                    };
                    let node = self.internal_mut(node_id);
                    node.keys.push(separator);
                    node.keys.extend(right.keys);
                    node.children.extend(right.children);
                    IndexStats::bump(&self.stats.merges);
                    debug!("merged right sibling {} into internal {}", right_id, node_id);
                    key_idx = idx;
                    child_idx = idx + 1;
                }
                (None, None) => unreachable!("non-root {} has no siblings", node_id),
            }
        }
    }
}
