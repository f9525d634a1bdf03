use blockdb::{BPlusTree, Database, DiskStore, Record, RecordRef, StorageConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const RECORDS: usize = 20_000;

fn refs(count: usize) -> Vec<(i32, RecordRef)> {
    let mut store = DiskStore::new(StorageConfig::new(500, 500 * 1000)).unwrap();
    (0..count)
        .map(|i| {
            let votes = ((i * 7919) % count) as i32;
            let record = Record::new("tt0000000", 50, votes).unwrap();
            (votes, store.insert(&record).unwrap())
        })
        .collect()
}

fn insert_benchmark(c: &mut Criterion) {
    let entries = refs(RECORDS);
    let mut group = c.benchmark_group("insert");

    for block_size in [100, 500, 2000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, &block_size| {
                b.iter(|| {
                    let mut tree = BPlusTree::new(block_size).unwrap();
                    for &(key, record_ref) in &entries {
                        tree.insert(key, record_ref);
                    }
                    black_box(tree.height());
                })
            },
        );
    }
    group.finish();
}

fn search_benchmark(c: &mut Criterion) {
    let mut tree = BPlusTree::new(500).unwrap();
    for (key, record_ref) in refs(RECORDS) {
        tree.insert(key, record_ref);
    }

    c.bench_function("search_hit", |b| {
        let mut key = 0;
        b.iter(|| {
            key = (key + 7) % RECORDS as i32;
            black_box(tree.search(black_box(key)));
        })
    });

    c.bench_function("search_miss", |b| {
        b.iter(|| black_box(tree.search(black_box(-1))))
    });
}

fn range_benchmark(c: &mut Criterion) {
    let mut db = Database::new(StorageConfig::new(500, 500 * 1000)).unwrap();
    for i in 0..RECORDS {
        let record = Record::new("tt0000000", (i % 100) as u8, (i % 5000) as i32).unwrap();
        db.insert(&record).unwrap();
    }

    let mut group = c.benchmark_group("range");
    group.bench_function("index_only", |b| {
        b.iter(|| {
            let count = db.index().range(black_box(1000)..=black_box(2000)).count();
            black_box(count);
        })
    });
    group.bench_function("with_records", |b| {
        b.iter(|| black_box(db.range(black_box(1000), black_box(2000)).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, insert_benchmark, search_benchmark, range_benchmark);
criterion_main!(benches);
