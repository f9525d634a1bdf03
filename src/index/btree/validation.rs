//! Invariant checks for BPlusTree.
//!
//! [`BPlusTree::validate`] walks the whole tree and reports the first
//! violation it finds. Correct operation never fails these checks; they
//! exist for tests and for callers that want to verify a loaded index.

use crate::common::{Error, Result};

use super::{BPlusTree, Key, Node, NodeId};

/// Totals gathered while walking the tree.
#[derive(Default)]
struct Walk {
    leaves: Vec<NodeId>,
    leaf_depth: Option<usize>,
    nodes: usize,
    keys: usize,
    records: usize,
}

fn corrupted(msg: String) -> Error {
    Error::CorruptedIndex(msg)
}

impl BPlusTree {
    /// Check every structural invariant of the tree.
    ///
    /// - keys strictly ascending within each node
    /// - every key within the bounds set by the separators above it
    /// - occupancy between the minimum and `n` keys (the root is exempt from
    ///   the minimum), and `keys + 1` children per internal node
    /// - all leaves at the same depth, no empty buckets
    /// - the forward-link chain visits every leaf once, left to right
    /// - node, key and record totals match the tree's counters
    ///
    /// # Errors
    /// Returns `Error::CorruptedIndex` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root else {
            if self.key_count != 0 || self.record_count != 0 || self.arena.len() != 0 {
                return Err(corrupted(format!(
                    "empty tree reports {} keys, {} records, {} nodes",
                    self.key_count,
                    self.record_count,
                    self.arena.len()
                )));
            }
            return Ok(());
        };

        let mut walk = Walk::default();
        self.check_node(root, None, None, 0, true, &mut walk)?;

        self.check_leaf_chain(&walk.leaves)?;

        if walk.nodes != self.arena.len() {
            return Err(corrupted(format!(
                "{} nodes reachable but {} allocated",
                walk.nodes,
                self.arena.len()
            )));
        }
        if walk.keys != self.key_count {
            return Err(corrupted(format!(
                "{} keys in leaves but counter says {}",
                walk.keys, self.key_count
            )));
        }
        if walk.records != self.record_count {
            return Err(corrupted(format!(
                "{} records in buckets but counter says {}",
                walk.records, self.record_count
            )));
        }
        Ok(())
    }

    fn check_node(
        &self,
        id: NodeId,
        lower: Option<Key>,
        upper: Option<Key>,
        depth: usize,
        is_root: bool,
        walk: &mut Walk,
    ) -> Result<()> {
        let node = self
            .arena
            .get(id)
            .ok_or_else(|| corrupted(format!("{} is referenced but not allocated", id)))?;
        walk.nodes += 1;

        let keys = node.keys();
        if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(corrupted(format!("{} keys out of order: {}", id, node)));
        }
        if let (Some(lower), Some(&first)) = (lower, keys.first()) {
            if first < lower {
                return Err(corrupted(format!("{} key {} below bound {}", id, first, lower)));
            }
        }
        if let (Some(upper), Some(&last)) = (upper, keys.last()) {
            if last >= upper {
                return Err(corrupted(format!("{} key {} not below bound {}", id, last, upper)));
            }
        }
        if keys.len() > self.max_keys {
            return Err(corrupted(format!(
                "{} holds {} keys, more than {}",
                id,
                keys.len(),
                self.max_keys
            )));
        }

        match node {
            Node::Leaf(leaf) => {
                let min = if is_root { 1 } else { self.min_leaf_keys() };
                if leaf.len() < min {
                    return Err(corrupted(format!(
                        "leaf {} holds {} keys, fewer than {}",
                        id,
                        leaf.len(),
                        min
                    )));
                }
                if leaf.buckets.len() != leaf.keys.len() {
                    return Err(corrupted(format!(
                        "leaf {} has {} keys but {} buckets",
                        id,
                        leaf.keys.len(),
                        leaf.buckets.len()
                    )));
                }
                if leaf.buckets.iter().any(Vec::is_empty) {
                    return Err(corrupted(format!("leaf {} has an empty bucket", id)));
                }
                match walk.leaf_depth {
                    Some(expected) if expected != depth => {
                        return Err(corrupted(format!(
                            "leaf {} at depth {}, others at {}",
                            id, depth, expected
                        )));
                    }
                    _ => walk.leaf_depth = Some(depth),
                }

                walk.leaves.push(id);
                walk.keys += leaf.len();
                walk.records += leaf.buckets.iter().map(Vec::len).sum::<usize>();
            }
            Node::Internal(internal) => {
                let min = if is_root { 1 } else { self.min_internal_keys() };
                if internal.len() < min {
                    return Err(corrupted(format!(
                        "internal {} holds {} keys, fewer than {}",
                        id,
                        internal.len(),
                        min
                    )));
                }
                if internal.children.len() != internal.keys.len() + 1 {
                    return Err(corrupted(format!(
                        "internal {} has {} keys but {} children",
                        id,
                        internal.keys.len(),
                        internal.children.len()
                    )));
                }

                for (i, &child) in internal.children.iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { Some(internal.keys[i - 1]) };
                    let child_upper = internal.keys.get(i).copied().or(upper);
                    self.check_node(child, child_lower, child_upper, depth + 1, false, walk)?;
                }
            }
        }
        Ok(())
    }

    fn check_leaf_chain(&self, leaves: &[NodeId]) -> Result<()> {
        let mut current = self.first_leaf();
        for (position, &expected) in leaves.iter().enumerate() {
            if current != Some(expected) {
                return Err(corrupted(format!(
                    "leaf chain position {} is {:?}, expected {}",
                    position, current, expected
                )));
            }
            current = self.leaf_ref(expected).next;
        }
        if let Some(extra) = current {
            return Err(corrupted(format!("leaf chain continues past the last leaf to {}", extra)));
        }
        Ok(())
    }
}
