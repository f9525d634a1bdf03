//! Disk Store - the simulated block-addressed disk.
//!
//! The [`DiskStore`] owns one fixed-size byte arena and handles:
//! - Appending records block by block
//! - Mapping record references to block ids
//! - Block introspection (contents, checksums)

use log::{info, trace};

use crate::common::{BlockId, Error, RecordRef, Result, StorageConfig};
use crate::storage::Record;

/// Fixed-capacity arena of blocks holding [`Record`]s.
///
/// # Arena Layout
/// Records are written sequentially, filling one block before moving on:
/// ```text
/// ┌──────────────────────┬──────────────────────┬─────────┐
/// │ Block 0              │ Block 1              │  ...    │
/// │ [r0][r1]...[r30][pad]│ [r31][r32]...   [pad]│         │
/// └──────────────────────┴──────────────────────┴─────────┘
/// Offset: 0              block_size             2×block_size
/// ```
///
/// Slot S of block B starts at `B × block_size + S × Record::SIZE`. Bytes
/// past the last whole record of a block stay unused.
///
/// # Ownership
/// The store is the only owner of record bytes. It hands out [`RecordRef`]s,
/// which are plain offsets and only mean something to this store.
pub struct DiskStore {
    data: Box<[u8]>,
    block_size: usize,
    records_per_block: usize,
    max_blocks: usize,
    /// Block the next record goes into.
    block_idx: usize,
    /// Slot within `block_idx` the next record goes into.
    slot_idx: usize,
    record_count: usize,
}

impl DiskStore {
    /// Create an empty, zeroed disk.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the config fails validation.
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;

        let store = Self {
            data: vec![0u8; config.disk_size].into_boxed_slice(),
            block_size: config.block_size,
            records_per_block: config.records_per_block(),
            max_blocks: config.max_blocks(),
            block_idx: 0,
            slot_idx: 0,
            record_count: 0,
        };

        info!(
            "disk store: {} bytes, {}-byte blocks, {} records per block, {} blocks",
            config.disk_size, store.block_size, store.records_per_block, store.max_blocks
        );

        Ok(store)
    }

    /// Write a record at the next free slot.
    ///
    /// Moves on to the next block once the current one holds
    /// `records_per_block` records.
    ///
    /// # Errors
    /// Returns `Error::DiskFull` once every block is full.
    pub fn insert(&mut self, record: &Record) -> Result<RecordRef> {
        if self.block_idx >= self.max_blocks {
            return Err(Error::DiskFull {
                blocks: self.max_blocks,
            });
        }

        let offset = self.offset_of(self.block_idx, self.slot_idx);
        record.write_to(&mut self.data[offset..offset + Record::SIZE]);
        trace!(
            "wrote {} at block {} slot {}",
            record.identifier(),
            self.block_idx,
            self.slot_idx
        );

        self.record_count += 1;
        self.slot_idx += 1;
        if self.slot_idx == self.records_per_block {
            self.block_idx += 1;
            self.slot_idx = 0;
        }

        Ok(RecordRef::new(offset))
    }

    /// Read the record at a block/slot address.
    ///
    /// # Errors
    /// - `Error::BlockOutOfRange` if the block lies past the end of the disk
    /// - `Error::SlotNotWritten` if nothing has been stored there yet
    pub fn resolve(&self, block_id: BlockId, slot: usize) -> Result<Record> {
        if block_id.0 >= self.max_blocks {
            return Err(Error::BlockOutOfRange(block_id));
        }
        if !self.is_written(block_id.0, slot) {
            return Err(Error::SlotNotWritten {
                block: block_id,
                slot,
            });
        }

        let offset = self.offset_of(block_id.0, slot);
        Ok(Record::from_bytes(&self.data[offset..offset + Record::SIZE]))
    }

    /// Read the record a reference points at.
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve); a reference from this store's
    /// `insert` always succeeds.
    pub fn read(&self, record_ref: RecordRef) -> Result<Record> {
        let block_id = self.block_of(record_ref);
        let slot = (record_ref.offset() % self.block_size) / Record::SIZE;
        self.resolve(block_id, slot)
    }

    /// Block that holds the referenced record.
    #[inline]
    pub fn block_of(&self, record_ref: RecordRef) -> BlockId {
        BlockId::new(record_ref.offset() / self.block_size)
    }

    /// All records in a block, in slot order.
    ///
    /// Only written slots are returned; an untouched block is empty.
    ///
    /// # Errors
    /// Returns `Error::BlockOutOfRange` if the block lies past the end of the disk.
    pub fn block_records(&self, block_id: BlockId) -> Result<Vec<Record>> {
        if block_id.0 >= self.max_blocks {
            return Err(Error::BlockOutOfRange(block_id));
        }

        let records = (0..self.records_per_block)
            .take_while(|&slot| self.is_written(block_id.0, slot))
            .map(|slot| {
                let offset = self.offset_of(block_id.0, slot);
                Record::from_bytes(&self.data[offset..offset + Record::SIZE])
            })
            .collect();

        Ok(records)
    }

    /// Render the identifiers stored in a block, space separated.
    ///
    /// # Errors
    /// Returns `Error::BlockOutOfRange` if the block lies past the end of the disk.
    pub fn dump_block(&self, block_id: BlockId) -> Result<String> {
        let identifiers: Vec<String> = self
            .block_records(block_id)?
            .iter()
            .map(|record| record.identifier().to_string())
            .collect();
        Ok(identifiers.join(" "))
    }

    /// CRC32 over the raw bytes of a block.
    ///
    /// # Errors
    /// Returns `Error::BlockOutOfRange` if the block lies past the end of the disk.
    pub fn block_checksum(&self, block_id: BlockId) -> Result<u32> {
        if block_id.0 >= self.max_blocks {
            return Err(Error::BlockOutOfRange(block_id));
        }

        let start = block_id.0 * self.block_size;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.data[start..start + self.block_size]);
        Ok(hasher.finalize())
    }

    /// Number of blocks holding at least one record.
    #[inline]
    pub fn blocks_used(&self) -> usize {
        self.record_count.div_ceil(self.records_per_block)
    }

    /// Bytes taken up by the used blocks (`blocks_used × block_size`).
    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.blocks_used() * self.block_size
    }

    /// Number of records written so far.
    #[inline]
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Size of a block in bytes.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of records that fit in one block.
    #[inline]
    pub fn records_per_block(&self) -> usize {
        self.records_per_block
    }

    /// Number of blocks on the disk.
    #[inline]
    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    #[inline]
    fn offset_of(&self, block: usize, slot: usize) -> usize {
        block * self.block_size + slot * Record::SIZE
    }

    fn is_written(&self, block: usize, slot: usize) -> bool {
        slot < self.records_per_block && block * self.records_per_block + slot < self.record_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 64-byte blocks hold 4 records; 4 blocks hold 16.
    fn small_store() -> DiskStore {
        DiskStore::new(StorageConfig::new(64, 256)).unwrap()
    }

    fn record(i: i32) -> Record {
        Record::new(&format!("tt{:07}", i), (i % 100) as u8, i).unwrap()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = small_store();
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.blocks_used(), 0);
        assert_eq!(store.used_bytes(), 0);
        assert_eq!(store.records_per_block(), 4);
        assert_eq!(store.max_blocks(), 4);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(DiskStore::new(StorageConfig::new(8, 256)).is_err());
    }

    #[test]
    fn test_insert_and_read() {
        let mut store = small_store();

        let r = store.insert(&record(7)).unwrap();
        assert_eq!(r.offset(), 0);
        assert_eq!(store.read(r).unwrap(), record(7));
        assert_eq!(store.resolve(BlockId::new(0), 0).unwrap(), record(7));
    }

    #[test]
    fn test_insert_wraps_to_next_block() {
        let mut store = small_store();

        let refs: Vec<RecordRef> = (0..6).map(|i| store.insert(&record(i)).unwrap()).collect();

        assert_eq!(store.block_of(refs[3]), BlockId::new(0));
        assert_eq!(store.block_of(refs[4]), BlockId::new(1));
        assert_eq!(refs[4].offset(), 64);
        assert_eq!(refs[5].offset(), 64 + Record::SIZE);
        assert_eq!(store.blocks_used(), 2);
    }

    #[test]
    fn test_full_block_does_not_count_next() {
        let mut store = small_store();
        for i in 0..4 {
            store.insert(&record(i)).unwrap();
        }
        assert_eq!(store.blocks_used(), 1);
        assert_eq!(store.used_bytes(), 64);
    }

    #[test]
    fn test_disk_full() {
        let mut store = small_store();

        for i in 0..16 {
            assert!(store.insert(&record(i)).is_ok());
        }

        let result = store.insert(&record(16));
        assert!(matches!(result, Err(Error::DiskFull { blocks: 4 })));
        assert_eq!(store.record_count(), 16);
    }

    #[test]
    fn test_resolve_unwritten_slot() {
        let mut store = small_store();
        store.insert(&record(0)).unwrap();

        let result = store.resolve(BlockId::new(0), 1);
        assert!(matches!(result, Err(Error::SlotNotWritten { slot: 1, .. })));

        // Past the block capacity
        let result = store.resolve(BlockId::new(0), 4);
        assert!(matches!(result, Err(Error::SlotNotWritten { .. })));
    }

    #[test]
    fn test_resolve_block_out_of_range() {
        let store = small_store();
        let result = store.resolve(BlockId::new(4), 0);
        assert!(matches!(result, Err(Error::BlockOutOfRange(_))));
    }

    #[test]
    fn test_block_records_and_dump() {
        let mut store = small_store();
        for i in 0..6 {
            store.insert(&record(i)).unwrap();
        }

        let block1 = store.block_records(BlockId::new(1)).unwrap();
        assert_eq!(block1, vec![record(4), record(5)]);

        assert_eq!(
            store.dump_block(BlockId::new(0)).unwrap(),
            "tt0000000 tt0000001 tt0000002 tt0000003"
        );
        assert_eq!(store.dump_block(BlockId::new(2)).unwrap(), "");
        assert!(store.dump_block(BlockId::new(9)).is_err());
    }

    #[test]
    fn test_block_checksum_tracks_writes() {
        let mut store = small_store();

        let empty0 = store.block_checksum(BlockId::new(0)).unwrap();
        let empty1 = store.block_checksum(BlockId::new(1)).unwrap();
        assert_eq!(empty0, empty1);

        store.insert(&record(1)).unwrap();
        assert_ne!(store.block_checksum(BlockId::new(0)).unwrap(), empty0);
        assert_eq!(store.block_checksum(BlockId::new(1)).unwrap(), empty1);

        assert!(store.block_checksum(BlockId::new(4)).is_err());
    }

    #[test]
    fn test_trailing_block_bytes_unused() {
        // 70-byte blocks hold 4 records and leave 6 bytes of padding.
        let mut store = DiskStore::new(StorageConfig::new(70, 140)).unwrap();
        let refs: Vec<RecordRef> = (0..5).map(|i| store.insert(&record(i)).unwrap()).collect();

        assert_eq!(refs[4].offset(), 70);
        assert_eq!(store.read(refs[4]).unwrap(), record(4));
        assert_eq!(store.block_of(refs[3]), BlockId::new(0));
    }
}
