//! Experiment driver: loads a TSV data file, builds the vote-count index and
//! reports the cost of a point lookup, a range scan and a deletion.

use std::path::{Path, PathBuf};
use std::process;

use blockdb::{ingest, Database, Node, QueryReport, StorageConfig, DEFAULT_BLOCK_SIZE};
use clap::{value_parser, Arg, ArgMatches, Command};
use log::{error, info};

use blockdb::common::config::DEFAULT_DISK_SIZE;

const RULE: &str = "===========================================";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = prepare_matches();
    if let Err(e) = run(&matches) {
        error!("{}", e);
        process::exit(1);
    }
}

fn prepare_matches() -> ArgMatches {
    Command::new("blockdb")
        .about("Block-addressed record store with a B+ tree index on numVotes")
        .arg(
            Arg::new("data")
                .long("data")
                .short('d')
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .default_value("data/data.tsv")
                .help("tab-separated input: tconst, averageRating, numVotes"),
        )
        .arg(
            Arg::new("block-size")
                .long("block-size")
                .short('b')
                .takes_value(true)
                .value_parser(value_parser!(usize))
                .default_value("500")
                .help("bytes per block and per index node"),
        )
        .arg(
            Arg::new("disk-size")
                .long("disk-size")
                .takes_value(true)
                .value_parser(value_parser!(usize))
                .default_value("100000000")
                .help("by default 100MB"),
        )
        .arg(
            Arg::new("point-key")
                .long("point-key")
                .takes_value(true)
                .value_parser(value_parser!(i32))
                .default_value("500"),
        )
        .arg(
            Arg::new("range-start")
                .long("range-start")
                .takes_value(true)
                .value_parser(value_parser!(i32))
                .default_value("30000"),
        )
        .arg(
            Arg::new("range-end")
                .long("range-end")
                .takes_value(true)
                .value_parser(value_parser!(i32))
                .default_value("40000"),
        )
        .arg(
            Arg::new("remove-key")
                .long("remove-key")
                .takes_value(true)
                .value_parser(value_parser!(i32))
                .default_value("1000"),
        )
        .get_matches()
}

fn run(matches: &ArgMatches) -> blockdb::Result<()> {
    let block_size = matches
        .get_one::<usize>("block-size")
        .copied()
        .unwrap_or(DEFAULT_BLOCK_SIZE);
    let disk_size = matches
        .get_one::<usize>("disk-size")
        .copied()
        .unwrap_or(DEFAULT_DISK_SIZE);
    let key = |name: &str, default: i32| matches.get_one::<i32>(name).copied().unwrap_or(default);

    let mut db = Database::new(StorageConfig::new(block_size, disk_size))?;

    let data = matches
        .get_one::<PathBuf>("data")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("data/data.tsv"));
    build(&mut db, &data)?;

    point_lookup(&db, key("point-key", 500))?;
    range_scan(&db, key("range-start", 30_000), key("range-end", 40_000))?;
    delete(&mut db, key("remove-key", 1000));

    info!("index stats: {}", db.index().stats().snapshot());
    println!("End of program!");
    Ok(())
}

/// Experiments 1 and 2: store the records and build the index.
fn build(db: &mut Database, data: &Path) -> blockdb::Result<()> {
    println!("EXPERIMENT 1 & 2");
    println!("Inserting records from the data file into disk and building index...");

    let count = ingest::load_file(data, db)?;
    let store = db.store();
    println!(" -> No of records processed: {}", count);
    println!(" -> No of blocks used: {} blocks", store.blocks_used());
    println!(
        " -> Size of the database (blocks used x blockSize): {} bytes",
        store.used_bytes()
    );

    println!(" -> Parameter N of the B+ Tree: {}", db.index().max_keys());
    print_shape(db);

    db.index().reset_node_accesses();
    println!("{}", RULE);
    Ok(())
}

/// Experiment 3: every record with exactly `key` votes.
fn point_lookup(db: &Database, key: i32) -> blockdb::Result<()> {
    println!("EXPERIMENT 3");
    let report = db.lookup(key)?;
    print_report(db, &report)?;
    println!("{}", RULE);
    Ok(())
}

/// Experiment 4: every record with `lo..=hi` votes.
fn range_scan(db: &Database, lo: i32, hi: i32) -> blockdb::Result<()> {
    println!("EXPERIMENT 4");
    let report = db.range(lo, hi)?;
    print_report(db, &report)?;
    println!("{}", RULE);
    Ok(())
}

/// Experiment 5: drop `key` from the index and report the new shape.
fn delete(db: &mut Database, key: i32) {
    println!("EXPERIMENT 5");
    let report = db.remove(key);
    println!(" -> No of records removed from the index: {}", report.records_removed);
    println!(
        " -> No of times that a node is deleted (or two nodes are merged): {}",
        report.nodes_deleted()
    );
    println!(" -> No of nodes in the updated B+ tree: {}", report.nodes_after);
    println!(" -> Height of the updated B+ tree: {}", report.height_after);
    print_nodes(db);
    println!("{}", RULE);
}

fn print_shape(db: &Database) {
    println!(" -> No of nodes in the B+ Tree: {}", db.index().node_count());
    println!(" -> Height of the B+ Tree: {}", db.index().height());
    print_nodes(db);
}

fn print_nodes(db: &Database) {
    let index = db.index();
    let show = |node: Option<&Node>| node.map_or_else(|| "(none)".to_string(), ToString::to_string);

    let first_child = index
        .root()
        .and_then(Node::as_internal)
        .and_then(|root| root.children().first())
        .and_then(|&id| index.node(id));

    println!(" -> Content of rootNode: {}", show(index.root()));
    println!(" -> Content of rootNode's first child node: {}", show(first_child));
}

fn print_report(db: &Database, report: &QueryReport) -> blockdb::Result<()> {
    println!(" -> Index Nodes accessed (first {}):", QueryReport::NODES_SHOWN);
    for node in &report.visited_nodes {
        println!("    {}", node);
    }
    println!(" -> No of Index Nodes accessed: {}", report.index_nodes_accessed);

    println!(" -> Data Blocks accessed (first {}):", QueryReport::NODES_SHOWN);
    for &block in report.first_blocks() {
        println!("    {}: {}", block, db.store().dump_block(block)?);
    }
    println!(" -> No of Data blocks accessed: {}", report.data_blocks_accessed());
    println!(" -> No of unique Data blocks accessed: {}", report.unique_blocks());

    match report.average_rating() {
        Some(average) => println!(" -> Average of averageRating: {:.4}", average),
        None => println!(" -> Average of averageRating: no matching records"),
    }
    Ok(())
}
