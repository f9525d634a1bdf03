//! Fixed-width record layout.
//!
//! Every record occupies exactly [`Record::SIZE`] bytes inside a block:
//! - identifier (NUL padded)
//! - rating scaled by 10
//! - vote count, the indexed key

use std::fmt;

use crate::common::config::IDENTIFIER_CAPACITY;
use crate::common::{Error, Result};

/// One row of the data set.
///
/// # Layout (16 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       10    identifier (UTF-8, NUL padded)
/// 10      1     rating × 10
/// 11      1     padding (always zero)
/// 12      4     num_votes (i32, little-endian)
/// ```
///
/// # Rating
/// The rating keeps one decimal digit: `7.3` is stored as `73`.
///
/// # Example
/// ```
/// use blockdb::Record;
///
/// let record = Record::new("tt0000001", 57, 1645).unwrap();
/// assert_eq!(record.average_rating(), 5.7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    identifier: String,
    rating: u8,
    num_votes: i32,
}

impl Record {
    /// Size of an encoded record in bytes.
    pub const SIZE: usize = 16;

    /// Offset of each field within the record.
    pub const OFFSET_IDENTIFIER: usize = 0;
    pub const OFFSET_RATING: usize = 10;
    pub const OFFSET_NUM_VOTES: usize = 12;

    /// Create a record from its fields.
    ///
    /// # Errors
    /// Returns `Error::InvalidRecord` if the identifier is longer than
    /// [`IDENTIFIER_CAPACITY`] bytes or contains a NUL byte.
    pub fn new(identifier: &str, rating: u8, num_votes: i32) -> Result<Self> {
        if identifier.len() > IDENTIFIER_CAPACITY {
            return Err(Error::InvalidRecord(format!(
                "identifier '{}' exceeds {} bytes",
                identifier, IDENTIFIER_CAPACITY
            )));
        }
        if identifier.contains('\0') {
            return Err(Error::InvalidRecord(format!(
                "identifier {:?} contains a NUL byte",
                identifier
            )));
        }

        Ok(Self {
            identifier: identifier.to_string(),
            rating,
            num_votes,
        })
    }

    /// The record identifier.
    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The rating scaled by 10.
    #[inline]
    pub fn rating(&self) -> u8 {
        self.rating
    }

    /// The rating as a decimal value.
    #[inline]
    pub fn average_rating(&self) -> f32 {
        self.rating as f32 / 10.0
    }

    /// The vote count (the index key).
    #[inline]
    pub fn num_votes(&self) -> i32 {
        self.num_votes
    }

    /// Read a record from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < Record::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for Record");

        let raw_identifier =
            &data[Self::OFFSET_IDENTIFIER..Self::OFFSET_IDENTIFIER + IDENTIFIER_CAPACITY];
        let len = raw_identifier
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(IDENTIFIER_CAPACITY);
        let identifier = String::from_utf8_lossy(&raw_identifier[..len]).into_owned();

        let rating = data[Self::OFFSET_RATING];

        let num_votes = i32::from_le_bytes([
            data[Self::OFFSET_NUM_VOTES],
            data[Self::OFFSET_NUM_VOTES + 1],
            data[Self::OFFSET_NUM_VOTES + 2],
            data[Self::OFFSET_NUM_VOTES + 3],
        ]);

        Self {
            identifier,
            rating,
            num_votes,
        }
    }

    /// Write this record to the beginning of a byte slice.
    ///
    /// The whole record area is overwritten, padding included.
    ///
    /// # Panics
    /// Panics if `data.len() < Record::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for Record");

        data[..Self::SIZE].fill(0);

        let id_bytes = self.identifier.as_bytes();
        data[Self::OFFSET_IDENTIFIER..Self::OFFSET_IDENTIFIER + id_bytes.len()]
            .copy_from_slice(id_bytes);

        data[Self::OFFSET_RATING] = self.rating;

        let votes_bytes = self.num_votes.to_le_bytes();
        data[Self::OFFSET_NUM_VOTES..Self::OFFSET_NUM_VOTES + 4].copy_from_slice(&votes_bytes);
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {:.1} / {}",
            self.identifier,
            self.average_rating(),
            self.num_votes
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new() {
        let record = Record::new("tt0000001", 57, 1645).unwrap();
        assert_eq!(record.identifier(), "tt0000001");
        assert_eq!(record.rating(), 57);
        assert_eq!(record.num_votes(), 1645);
        assert_eq!(record.average_rating(), 5.7);
    }

    #[test]
    fn test_identifier_at_capacity() {
        let record = Record::new("tt10000001", 10, 5).unwrap();
        assert_eq!(record.identifier().len(), IDENTIFIER_CAPACITY);
    }

    #[test]
    fn test_identifier_too_long() {
        let result = Record::new("tt100000001", 10, 5);
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_identifier_with_nul() {
        let result = Record::new("tt\0", 10, 5);
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_record_roundtrip() {
        let original = Record::new("tt0000042", 83, 250_000).unwrap();

        let mut buffer = [0xFFu8; Record::SIZE];
        original.write_to(&mut buffer);

        let recovered = Record::from_bytes(&buffer);
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_record_byte_layout() {
        let record = Record::new("ab", 73, 0x04030201).unwrap();

        let mut buffer = [0xFFu8; Record::SIZE];
        record.write_to(&mut buffer);

        // Verify exact byte layout
        assert_eq!(&buffer[0..2], b"ab");
        assert!(buffer[2..10].iter().all(|&b| b == 0)); // NUL padding
        assert_eq!(buffer[10], 73);
        assert_eq!(buffer[11], 0); // padding byte
        assert_eq!(buffer[12], 0x01); // num_votes byte 0 (LSB)
        assert_eq!(buffer[15], 0x04); // num_votes byte 3 (MSB)
    }

    #[test]
    fn test_negative_votes_roundtrip() {
        let record = Record::new("neg", 0, -17).unwrap();
        let mut buffer = [0u8; Record::SIZE];
        record.write_to(&mut buffer);
        assert_eq!(Record::from_bytes(&buffer).num_votes(), -17);
    }

    #[test]
    fn test_record_display() {
        let record = Record::new("tt0000001", 57, 1645).unwrap();
        assert_eq!(format!("{}", record), "tt0000001 / 5.7 / 1645");
    }
}
