//! blockdb - A block-addressed record store indexed by a B+ tree.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            blockdb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │          Driver (bin/blockdb.rs, ingest)                 │   │
//! │  │        TSV loader → experiments → console report         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Database (database.rs)                      │   │
//! │  │     point / range / delete queries → QueryReport         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                 ↓                             ↓                 │
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐   │
//! │  │   Index (index/btree)    │  │   Storage (storage/)     │   │
//! │  │  BPlusTree: key → bucket │─→│  DiskStore: blocks of    │   │
//! │  │  of RecordRefs, n keys   │  │  fixed-width Records     │   │
//! │  │  per block-sized node    │  │                          │   │
//! │  └──────────────────────────┘  └──────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything lives in memory. The block size drives both the number of
//! records per block and the number of keys per index node, so node
//! accesses and data blocks touched can be counted as if each were one I/O.
//!
//! # Modules
//! - [`common`] - Shared primitives (BlockId, RecordRef, Error, config)
//! - [`storage`] - Record layout and the block arena
//! - [`index`] - B+ tree index
//! - [`database`] - Store and index together, with query reports
//! - [`ingest`] - Tab-separated data loader
//!
//! # Quick Start
//! ```
//! use blockdb::{Database, Record, StorageConfig};
//!
//! let mut db = Database::new(StorageConfig::new(500, 100_000)).unwrap();
//! db.insert(&Record::new("tt0000001", 57, 1645).unwrap()).unwrap();
//! db.insert(&Record::new("tt0000002", 61, 198).unwrap()).unwrap();
//!
//! let report = db.lookup(1645).unwrap();
//! assert_eq!(report.records.len(), 1);
//! assert_eq!(report.records[0].identifier(), "tt0000001");
//! ```

pub mod common;
pub mod database;
pub mod index;
pub mod ingest;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::DEFAULT_BLOCK_SIZE;
pub use common::{BlockId, Error, RecordRef, Result, StorageConfig};

pub use database::{Database, QueryReport, RemovalReport};
pub use index::{BPlusTree, IndexStats, IndexStatsSnapshot, Node, NodeId};
pub use storage::{DiskStore, Record};
