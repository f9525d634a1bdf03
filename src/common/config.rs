//! Configuration for the simulated disk and the index built over it.
//!
//! A single block size drives both layers:
//! - the [`DiskStore`](crate::storage::DiskStore) fits
//!   `block_size / Record::SIZE` records into each block
//! - the [`BPlusTree`](crate::index::BPlusTree) fits
//!   `(block_size - POINTER_SIZE) / (POINTER_SIZE + KEY_SIZE)` keys into each node

use crate::common::{Error, Result};
use crate::storage::Record;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 500;

/// Default disk size in bytes (100MB).
pub const DEFAULT_DISK_SIZE: usize = 100 * 1000 * 1000;

/// Size of a child or record pointer inside an index node.
///
/// Nodes are not serialized; this only feeds the capacity calculation,
/// which models a 64-bit address per pointer.
pub const POINTER_SIZE: usize = 8;

/// Size of an index key (a 32-bit vote count).
pub const KEY_SIZE: usize = 4;

/// Maximum length of a record identifier in bytes.
pub const IDENTIFIER_CAPACITY: usize = 10;

/// Smallest branching factor the index accepts.
///
/// With fewer than two keys per node a split cannot leave both halves
/// non-empty.
pub const MIN_BRANCHING_FACTOR: usize = 2;

/// Branching factor `n` for a node that must fit in `block_size` bytes.
#[inline]
pub fn branching_factor(block_size: usize) -> usize {
    block_size.saturating_sub(POINTER_SIZE) / (POINTER_SIZE + KEY_SIZE)
}

/// Sizes of the simulated disk.
///
/// # Node Capacity
/// One index node occupies one block:
/// ```text
/// | p | k | p | k | ... | k | p |
///   one pointer plus n (pointer, key) pairs
///
/// n = (block_size - POINTER_SIZE) / (POINTER_SIZE + KEY_SIZE)
/// ```
/// With the default 500-byte block, n = 41.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Size of one block in bytes.
    pub block_size: usize,
    /// Total size of the disk arena in bytes.
    pub disk_size: usize,
}

impl StorageConfig {
    /// Create a config with the given block and disk sizes.
    pub fn new(block_size: usize, disk_size: usize) -> Self {
        Self {
            block_size,
            disk_size,
        }
    }

    /// Check that both layers can operate with these sizes.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if a block cannot hold one record,
    /// the derived branching factor is below [`MIN_BRANCHING_FACTOR`], or
    /// the disk is smaller than one block.
    pub fn validate(&self) -> Result<()> {
        if self.records_per_block() == 0 {
            return Err(Error::InvalidConfig(format!(
                "block size {} cannot hold a {}-byte record",
                self.block_size,
                Record::SIZE
            )));
        }
        if self.max_keys() < MIN_BRANCHING_FACTOR {
            return Err(Error::InvalidConfig(format!(
                "block size {} gives {} keys per node (minimum {})",
                self.block_size,
                self.max_keys(),
                MIN_BRANCHING_FACTOR
            )));
        }
        if self.max_blocks() == 0 {
            return Err(Error::InvalidConfig(format!(
                "disk size {} is smaller than one {}-byte block",
                self.disk_size, self.block_size
            )));
        }
        Ok(())
    }

    /// Number of records that fit in one block.
    #[inline]
    pub fn records_per_block(&self) -> usize {
        self.block_size / Record::SIZE
    }

    /// Number of whole blocks on the disk.
    #[inline]
    pub fn max_blocks(&self) -> usize {
        self.disk_size / self.block_size
    }

    /// Total number of records the disk can hold.
    #[inline]
    pub fn record_capacity(&self) -> usize {
        self.max_blocks() * self.records_per_block()
    }

    /// Branching factor `n`: maximum keys per node.
    #[inline]
    pub fn max_keys(&self) -> usize {
        branching_factor(self.block_size)
    }

    /// Maximum children of an internal node (`n + 1`).
    #[inline]
    pub fn max_children(&self) -> usize {
        self.max_keys() + 1
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, DEFAULT_DISK_SIZE)
    }
}
