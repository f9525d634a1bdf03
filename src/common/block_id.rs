//! Block identifier type.

use std::fmt;

/// Identifies a block on the simulated disk.
///
/// Block N starts at arena offset `N × block_size`. Using `usize` keeps
/// offset arithmetic free of casts.
///
/// # Example
/// ```
/// use blockdb::BlockId;
///
/// let block_id = BlockId::new(42);
/// assert_eq!(block_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl BlockId {
    /// Create a new BlockId.
    #[inline]
    pub fn new(id: usize) -> Self {
        BlockId(id)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_new() {
        let bid = BlockId::new(42);
        assert_eq!(bid.0, 42);
    }

    #[test]
    fn test_block_id_ordering() {
        assert!(BlockId::new(1) < BlockId::new(2));
        assert!(BlockId::new(5) > BlockId::new(3));
    }

    #[test]
    fn test_block_id_display() {
        assert_eq!(format!("{}", BlockId::new(42)), "Block(42)");
    }
}
