//! Slot arena owning every node of a tree.
//!
//! Freed slots are reused before the arena grows, so a tree that splits and
//! merges repeatedly does not keep growing its backing vector.

use std::ops::{Index, IndexMut};

use super::node::{Node, NodeId};

#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Option<Node>>,
    free_list: Vec<usize>,
    live: usize,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id.
    pub(crate) fn allocate(&mut self, node: Node) -> NodeId {
        self.live += 1;
        match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                NodeId(idx)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Remove a node and hand it back to the caller.
    pub(crate) fn free(&mut self, id: NodeId) -> Option<Node> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.live -= 1;
        Some(node)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0)?.as_ref()
    }

    /// Number of live nodes.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.live = 0;
    }
}

/// Panics on a freed or unknown id, like slice indexing out of bounds.
impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("dangling {}", id),
        }
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("dangling {}", id),
        }
    }
}
