//! Database - a disk store together with its vote-count index.
//!
//! The [`Database`] writes every record to the [`DiskStore`] first and then
//! indexes the returned [`RecordRef`] under the record's vote count. Queries
//! go the other way: the index yields references, and the store resolves
//! them to records and block ids.
//!
//! Each query returns a report of what it touched, so that the cost of a
//! lookup can be compared in index node accesses and data blocks read.

use std::collections::BTreeSet;

use log::debug;

use crate::common::{BlockId, RecordRef, Result, StorageConfig};
use crate::index::{BPlusTree, Key, NodeId};
use crate::storage::{DiskStore, Record};

/// What a point or range query read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryReport {
    /// Index nodes visited, as counted by the tree's statistics.
    pub index_nodes_accessed: u64,
    /// Contents of the first [`NODES_SHOWN`](Self::NODES_SHOWN) index nodes
    /// visited, root first.
    pub visited_nodes: Vec<String>,
    /// Matching records in key order, duplicates in insertion order.
    pub records: Vec<Record>,
    /// Block of each record in `records`, one entry per record.
    pub block_ids: Vec<BlockId>,
}

impl QueryReport {
    /// Number of index nodes and data blocks a report lists in full.
    pub const NODES_SHOWN: usize = 5;

    /// Data block reads, one per record (a block may be read more than once).
    pub fn data_blocks_accessed(&self) -> usize {
        self.block_ids.len()
    }

    /// Distinct data blocks among the reads.
    pub fn unique_blocks(&self) -> usize {
        self.block_ids.iter().collect::<BTreeSet<_>>().len()
    }

    /// The first few blocks read, in read order.
    pub fn first_blocks(&self) -> &[BlockId] {
        &self.block_ids[..self.block_ids.len().min(Self::NODES_SHOWN)]
    }

    /// Mean of the records' average ratings; `None` when nothing matched.
    pub fn average_rating(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let total: u64 = self.records.iter().map(|r| u64::from(r.rating())).sum();
        Some(total as f64 / 10.0 / self.records.len() as f64)
    }
}

/// Outcome of removing a key from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalReport {
    /// References dropped with the key; 0 if the key was absent.
    pub records_removed: usize,
    pub nodes_before: usize,
    pub nodes_after: usize,
    pub height_after: usize,
}

impl RemovalReport {
    /// Nodes freed by merges and root collapses.
    pub fn nodes_deleted(&self) -> usize {
        self.nodes_before.saturating_sub(self.nodes_after)
    }

    pub fn found(&self) -> bool {
        self.records_removed > 0
    }
}

/// A [`DiskStore`] and the [`BPlusTree`] indexing it by vote count.
///
/// Both are sized from one [`StorageConfig`]: the block size sets records
/// per block and keys per node.
///
/// # Example
/// ```
/// use blockdb::{Database, Record, StorageConfig};
///
/// let mut db = Database::new(StorageConfig::new(500, 50_000)).unwrap();
/// for (i, votes) in [120, 500, 500, 980].into_iter().enumerate() {
///     let record = Record::new(&format!("tt{:07}", i), 70, votes).unwrap();
///     db.insert(&record).unwrap();
/// }
///
/// let report = db.range(100, 500).unwrap();
/// assert_eq!(report.records.len(), 3);
/// assert_eq!(report.unique_blocks(), 1);
///
/// let removal = db.remove(500);
/// assert_eq!(removal.records_removed, 2);
/// assert!(db.lookup(500).unwrap().records.is_empty());
/// ```
pub struct Database {
    config: StorageConfig,
    store: DiskStore,
    index: BPlusTree,
}

impl Database {
    /// Create an empty store and index.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the config fails validation.
    pub fn new(config: StorageConfig) -> Result<Self> {
        let store = DiskStore::new(config)?;
        let index = BPlusTree::new(config.block_size)?;
        Ok(Self {
            config,
            store,
            index,
        })
    }

    /// Store a record and index it under its vote count.
    ///
    /// # Errors
    /// Returns `Error::DiskFull` when the store has no free slot; the index
    /// is left untouched.
    pub fn insert(&mut self, record: &Record) -> Result<RecordRef> {
        let record_ref = self.store.insert(record)?;
        self.index.insert(record.num_votes(), record_ref);
        Ok(record_ref)
    }

    /// All records whose vote count equals `key`.
    ///
    /// # Errors
    /// Only if the index holds a reference the store cannot resolve.
    pub fn lookup(&self, key: Key) -> Result<QueryReport> {
        let before = self.index.node_accesses();
        let path = self.index.search_path(key);

        let mut report = QueryReport {
            visited_nodes: self.describe(&path),
            ..QueryReport::default()
        };

        let bucket = path
            .last()
            .and_then(|&leaf| self.index.leaf(leaf))
            .and_then(|leaf| leaf.get(key));
        for &record_ref in bucket.into_iter().flatten() {
            self.collect(key, record_ref, &mut report)?;
        }

        report.index_nodes_accessed = self.index.node_accesses().saturating_sub(before);
        debug!(
            "lookup {}: {} records, {} index nodes",
            key,
            report.records.len(),
            report.index_nodes_accessed
        );
        Ok(report)
    }

    /// All records whose vote count lies in `lo..=hi`.
    ///
    /// The scan descends once to the leaf for `lo` and then follows the
    /// forward links; `visited_nodes` lists the descent followed by the
    /// leaves that contributed records.
    ///
    /// # Errors
    /// Only if the index holds a reference the store cannot resolve.
    pub fn range(&self, lo: Key, hi: Key) -> Result<QueryReport> {
        let before = self.index.node_accesses();
        let mut report = QueryReport::default();

        let mut visited: Vec<NodeId> = match self.index.descend(lo) {
            Some((path, leaf)) => path
                .iter()
                .map(|step| step.node)
                .chain(std::iter::once(leaf))
                .collect(),
            None => Vec::new(),
        };

        let mut entries = self.index.range(lo..=hi);
        while let Some((key, bucket)) = entries.next() {
            if let Some(leaf) = entries.current_leaf() {
                if visited.last() != Some(&leaf) {
                    visited.push(leaf);
                }
            }
            for &record_ref in bucket {
                self.collect(key, record_ref, &mut report)?;
            }
        }

        report.visited_nodes = self.describe(&visited);
        report.index_nodes_accessed = self.index.node_accesses().saturating_sub(before);
        debug!(
            "range {}..={}: {} records, {} index nodes",
            lo,
            hi,
            report.records.len(),
            report.index_nodes_accessed
        );
        Ok(report)
    }

    /// Drop `key` and its whole bucket from the index.
    ///
    /// The records stay on disk; only the index forgets them.
    pub fn remove(&mut self, key: Key) -> RemovalReport {
        let nodes_before = self.index.node_count();
        let records_removed = self.index.remove(key).map_or(0, |bucket| bucket.len());

        RemovalReport {
            records_removed,
            nodes_before,
            nodes_after: self.index.node_count(),
            height_after: self.index.height(),
        }
    }

    #[inline]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &DiskStore {
        &self.store
    }

    #[inline]
    pub fn index(&self) -> &BPlusTree {
        &self.index
    }

    /// Records written to the store.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.record_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect(&self, key: Key, record_ref: RecordRef, report: &mut QueryReport) -> Result<()> {
        let record = self.store.read(record_ref)?;
        debug_assert_eq!(
            record.num_votes(),
            key,
            "{} is indexed under the wrong key",
            record_ref
        );
        report.block_ids.push(self.store.block_of(record_ref));
        report.records.push(record);
        Ok(())
    }

    fn describe(&self, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .take(QueryReport::NODES_SHOWN)
            .filter_map(|&id| self.index.node(id))
            .map(ToString::to_string)
            .collect()
    }
}
