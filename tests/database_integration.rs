//! Integration tests for the store, the index and the loader together.
//!
//! These tests verify cross-component behavior that unit tests don't cover.

use std::io::Write;

use blockdb::{ingest, BPlusTree, BlockId, Database, DiskStore, Error, Record, StorageConfig};
use tempfile::NamedTempFile;

fn record(i: usize, votes: i32) -> Record {
    Record::new(&format!("tt{:07}", i), 70, votes).unwrap()
}

/// Block size 500: duplicates share a bucket, one overfull leaf splits the
/// root, and removing the key merges the halves back.
#[test]
fn test_block_500_scenario() {
    let mut store = DiskStore::new(StorageConfig::new(500, 500 * 100)).unwrap();
    let mut tree = BPlusTree::new(500).unwrap();
    let n = tree.max_keys();
    assert_eq!(n, 41);

    let mut refs = Vec::new();
    for i in 0..3 {
        let record_ref = store.insert(&record(i, 500)).unwrap();
        tree.insert(500, record_ref);
        refs.push(record_ref);
    }
    assert_eq!(tree.search(500), Some(refs.as_slice()));
    assert_eq!(tree.node_count(), 1);

    // n more distinct keys after 500 overflow the single leaf
    for i in 0..n {
        let votes = 501 + i as i32;
        let record_ref = store.insert(&record(3 + i, votes)).unwrap();
        tree.insert(votes, record_ref);
    }
    let root = tree.root().unwrap().as_internal().unwrap();
    assert_eq!(root.keys().len(), 1);
    assert_eq!(root.children().len(), 2);
    assert_eq!(tree.height(), 2);

    let nodes_before = tree.node_count();
    let removed = tree.remove(500).unwrap();
    assert_eq!(removed, refs);
    assert_eq!(tree.search(500), None);
    assert!(tree.node_count() <= nodes_before);
    assert!(tree.validate().is_ok());
}

/// A store sized for exactly K records accepts K and rejects the next.
#[test]
fn test_disk_capacity_exact() {
    let config = StorageConfig::new(500, 500 * 3);
    let capacity = config.record_capacity();
    assert_eq!(capacity, 31 * 3);

    let mut store = DiskStore::new(config).unwrap();
    for i in 0..capacity {
        store.insert(&record(i, i as i32)).unwrap();
    }
    assert_eq!(store.blocks_used(), 3);

    let err = store.insert(&record(capacity, 0)).unwrap_err();
    assert!(matches!(err, Error::DiskFull { blocks: 3 }));
    assert_eq!(store.record_count(), capacity);
}

/// Records land in consecutive slots and blocks.
#[test]
fn test_block_addressing() {
    let mut store = DiskStore::new(StorageConfig::new(500, 500 * 10)).unwrap();
    let refs: Vec<_> = (0..70)
        .map(|i| store.insert(&record(i, i as i32)).unwrap())
        .collect();

    assert_eq!(store.block_of(refs[0]), BlockId(0));
    assert_eq!(store.block_of(refs[30]), BlockId(0));
    assert_eq!(store.block_of(refs[31]), BlockId(1));
    assert_eq!(store.block_of(refs[69]), BlockId(2));

    let resolved = store.resolve(BlockId(1), 0).unwrap();
    assert_eq!(resolved.identifier(), "tt0000031");
    assert_eq!(store.read(refs[69]).unwrap(), record(69, 69));

    let dump = store.dump_block(BlockId(2)).unwrap();
    assert_eq!(dump.split(' ').count(), 70 - 62);
    assert!(dump.starts_with("tt0000062"));
}

/// Load a file, run the three queries, and check them against brute force.
#[test]
fn test_load_and_query_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "tconst\taverageRating\tnumVotes").unwrap();
    for i in 0..2000 {
        let votes = (i * 37) % 1500;
        let rating = (i % 100) as f32 / 10.0;
        writeln!(file, "tt{:07}\t{:.1}\t{}", i, rating, votes).unwrap();
    }
    file.flush().unwrap();

    let mut db = Database::new(StorageConfig::new(500, 1_000_000)).unwrap();
    assert_eq!(ingest::load_file(file.path(), &mut db).unwrap(), 2000);
    assert_eq!(db.store().blocks_used(), 2000_usize.div_ceil(31));
    assert!(db.index().validate().is_ok());

    // Point lookup
    let expected: Vec<String> = (0..2000)
        .filter(|i| (i * 37) % 1500 == 500)
        .map(|i| format!("tt{:07}", i))
        .collect();
    let report = db.lookup(500).unwrap();
    let found: Vec<&str> = report.records.iter().map(Record::identifier).collect();
    assert_eq!(found, expected);
    assert_eq!(report.index_nodes_accessed, db.index().height() as u64);

    // Range scan
    let expected = (0..2000).filter(|i| (300..=600).contains(&((i * 37) % 1500))).count();
    let report = db.range(300, 600).unwrap();
    assert_eq!(report.records.len(), expected);
    assert!(report
        .records
        .windows(2)
        .all(|pair| pair[0].num_votes() <= pair[1].num_votes()));
    assert!(report.unique_blocks() <= report.data_blocks_accessed());

    // Delete
    let removal = db.remove(1000);
    assert!(removal.found());
    assert!(db.lookup(1000).unwrap().records.is_empty());
    assert!(db.index().validate().is_ok());
}

#[test]
fn test_invalid_configs() {
    // Record does not fit the block
    assert!(matches!(
        Database::new(StorageConfig::new(8, 1000)),
        Err(Error::InvalidConfig(_))
    ));
    // Disk smaller than one block
    assert!(matches!(
        Database::new(StorageConfig::new(500, 100)),
        Err(Error::InvalidConfig(_))
    ));
}
