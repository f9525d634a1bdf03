//! Index structures.
//!
//! - [`btree`] - B+ tree over `i32` keys whose nodes are sized to one block

pub mod btree;

pub use btree::{BPlusTree, IndexStats, IndexStatsSnapshot, Key, Node, NodeId, RangeIter};
