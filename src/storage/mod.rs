//! Storage layer - the simulated disk and its record format.
//!
//! This module handles record storage:
//! - [`DiskStore`] - Block-addressed byte arena
//! - [`Record`] - Fixed-width record layout

mod disk;
mod record;

pub use disk::DiskStore;
pub use record::Record;
