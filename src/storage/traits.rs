//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::{Record, StoredRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid timestamp stored for item {item_id}: {value}")]
    Timestamp { item_id: String, value: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Backends are used from a single writer. Records are keyed by `item_id`;
/// a record whose key is already stored is ignored, never updated.
pub trait Storage {
    /// Creates the backing table if it does not exist yet
    fn ensure_schema(&mut self) -> StorageResult<()>;

    /// Persists a batch of records atomically
    ///
    /// Already-stored `item_id`s are skipped silently. New rows are stamped
    /// with the current time.
    ///
    /// # Returns
    ///
    /// The number of rows that were actually inserted
    fn insert_batch(&mut self, records: &[Record]) -> StorageResult<usize>;

    /// Total number of distinct records stored
    fn count(&self) -> StorageResult<u64>;

    /// Looks up a stored record by its natural key
    fn get(&self, item_id: &str) -> StorageResult<Option<StoredRecord>>;
}
