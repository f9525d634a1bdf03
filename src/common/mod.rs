//! Common types and utilities shared across blockdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`StorageConfig`]
//! - Error types
//! - Identifiers ([`BlockId`], [`RecordRef`])

pub mod config;
pub mod error;
mod block_id;
mod record_ref;

pub use block_id::BlockId;
pub use config::StorageConfig;
pub use error::{Error, Result};
pub use record_ref::RecordRef;
