//! Error types for blockdb.

use thiserror::Error;

use crate::common::BlockId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in blockdb.
///
/// A missing key is not an error: lookups return `Option` and removal of an
/// absent key is a logged no-op.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every block of the disk is full.
    ///
    /// The caller must stop inserting; the store cannot reclaim space.
    #[error("Disk is full: all {blocks} blocks are in use")]
    DiskFull { blocks: usize },

    /// Block and disk sizes that the store or index cannot work with.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Block index beyond the end of the disk.
    #[error("{0} is out of range")]
    BlockOutOfRange(BlockId),

    /// Slot that has not been written yet (or lies past the block capacity).
    #[error("Slot {slot} of {block} does not hold a record")]
    SlotNotWritten { block: BlockId, slot: usize },

    /// Record fields that do not fit the fixed record layout.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Malformed line in a data file.
    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// The index failed an explicit invariant check.
    ///
    /// This indicates a bug - correct operation never produces it.
    #[error("Corrupted index: {0}")]
    CorruptedIndex(String),
}
