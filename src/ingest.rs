//! Tab-separated data loader.
//!
//! The input has a header line followed by one record per line:
//! ```text
//! tconst      averageRating   numVotes
//! tt0000001   5.7             1645
//! ```
//! Each line is parsed into a [`Record`] and inserted into a [`Database`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::common::{Error, Result};
use crate::database::Database;
use crate::storage::Record;

/// Parse a decimal rating into tenths, truncating after the first
/// fractional digit: `"5.7"` is 57, `"7.35"` is 73, `"8"` is 80.
///
/// Parsing is done on the digits directly, so no value is rounded down by
/// a binary fraction.
///
/// # Errors
/// Returns `Error::InvalidRecord` for anything other than an unsigned
/// decimal, or for a value above 25.5.
pub fn parse_rating(text: &str) -> Result<u8> {
    let invalid = || Error::InvalidRecord(format!("rating '{}' is not a decimal in 0..=25.5", text));

    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: u32 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let tenths = fraction.bytes().next().map_or(0, |b| u32::from(b - b'0'));

    whole
        .checked_mul(10)
        .and_then(|scaled| scaled.checked_add(tenths))
        .and_then(|scaled| u8::try_from(scaled).ok())
        .ok_or_else(invalid)
}

/// Parse one data line into a record.
///
/// `line_no` is 1-based and only used in error messages.
///
/// # Errors
/// Returns `Error::Parse` for missing fields, a bad rating, a bad vote count,
/// or an identifier that does not fit the record layout.
pub fn parse_line(line_no: usize, line: &str) -> Result<Record> {
    let parse_err = |reason: String| Error::Parse {
        line: line_no,
        reason,
    };

    let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');
    let (Some(identifier), Some(rating), Some(votes)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(parse_err(format!("expected 3 tab-separated fields in {:?}", line)));
    };

    let rating = parse_rating(rating.trim()).map_err(|e| parse_err(e.to_string()))?;
    let num_votes: i32 = votes
        .trim()
        .parse()
        .map_err(|e| parse_err(format!("vote count '{}': {}", votes, e)))?;

    Record::new(identifier.trim(), rating, num_votes).map_err(|e| parse_err(e.to_string()))
}

/// Load every record from `reader` into `db`.
///
/// The first line is a header and is skipped, as are blank lines.
/// Returns the number of records inserted.
///
/// # Errors
/// Stops at the first I/O error, malformed line, or `Error::DiskFull`.
pub fn load<R: BufRead>(reader: R, db: &mut Database) -> Result<usize> {
    let mut count = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 {
            debug!("skipping header {:?}", line);
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_line(idx + 1, &line)?;
        db.insert(&record)?;
        count += 1;
    }

    info!(
        "loaded {} records into {} blocks",
        count,
        db.store().blocks_used()
    );
    Ok(count)
}

/// Open `path` and [`load`] it into `db`.
///
/// # Errors
/// Returns `Error::Io` if the file cannot be opened, otherwise as [`load`].
pub fn load_file(path: impl AsRef<Path>, db: &mut Database) -> Result<usize> {
    let path = path.as_ref();
    info!("loading {}", path.display());
    let file = File::open(path)?;
    load(BufReader::new(file), db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::StorageConfig;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "tconst\taverageRating\tnumVotes\n\
                          tt0000001\t5.7\t1645\n\
                          tt0000002\t6.1\t198\n\
                          \n\
                          tt0000003\t6.5\t1645\n";

    fn db() -> Database {
        Database::new(StorageConfig::new(500, 50_000)).unwrap()
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("5.7").unwrap(), 57);
        assert_eq!(parse_rating("10.0").unwrap(), 100);
        assert_eq!(parse_rating("8").unwrap(), 80);
        assert_eq!(parse_rating("0.1").unwrap(), 1);
        assert_eq!(parse_rating(".5").unwrap(), 5);
        assert_eq!(parse_rating("25.5").unwrap(), 255);
    }

    #[test]
    fn test_parse_rating_truncates_exactly() {
        // 7.3 * 10 in binary floating point is 72.99...
        assert_eq!(parse_rating("7.3").unwrap(), 73);
        assert_eq!(parse_rating("7.35").unwrap(), 73);
        assert_eq!(parse_rating("7.39").unwrap(), 73);
    }

    #[test]
    fn test_parse_rating_rejects() {
        for bad in ["", ".", "-1.0", "abc", "5.x", "25.6", "1e3", "99999999999"] {
            assert!(
                matches!(parse_rating(bad), Err(Error::InvalidRecord(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_line() {
        let record = parse_line(2, "tt0000001\t5.7\t1645").unwrap();
        assert_eq!(record.identifier(), "tt0000001");
        assert_eq!(record.rating(), 57);
        assert_eq!(record.num_votes(), 1645);

        // Windows line endings
        let record = parse_line(3, "tt0000002\t6.1\t198\r").unwrap();
        assert_eq!(record.num_votes(), 198);
    }

    #[test]
    fn test_parse_line_errors_carry_line_number() {
        let err = parse_line(7, "tt0000001\t5.7").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 7, .. }));

        let err = parse_line(8, "tt0000001\t5.7\tmany").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 8, .. }));

        let err = parse_line(9, "tt000000000001\t5.7\t1").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 9, .. }));
    }

    #[test]
    fn test_load_skips_header_and_blank_lines() {
        let mut db = db();
        let count = load(Cursor::new(SAMPLE), &mut db).unwrap();

        assert_eq!(count, 3);
        assert_eq!(db.len(), 3);
        assert_eq!(db.index().len(), 2);

        let report = db.lookup(1645).unwrap();
        let ids: Vec<&str> = report.records.iter().map(Record::identifier).collect();
        assert_eq!(ids, vec!["tt0000001", "tt0000003"]);
    }

    #[test]
    fn test_load_stops_at_bad_line() {
        let mut db = db();
        let input = "header\ntt1\t5.0\t10\ntt2\tbad\t20\ntt3\t5.0\t30\n";
        let err = load(Cursor::new(input), &mut db).unwrap_err();

        assert!(matches!(err, Error::Parse { line: 3, .. }));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let mut db = db();
        assert_eq!(load_file(file.path(), &mut db).unwrap(), 3);
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = db();
        let err = load_file(dir.path().join("missing.tsv"), &mut db).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
