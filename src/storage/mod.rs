//! Storage module for persisting crawled records
//!
//! This module handles all database operations for the crawler:
//! - SQLite database initialization and schema management
//! - Idempotent batch insertion keyed by `item_id`
//! - Count and lookup queries

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}
