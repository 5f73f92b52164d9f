//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::record::{Record, StoredRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and makes sure the schema exists
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        let mut storage = Self { conn };
        storage.ensure_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let mut storage = Self {
            conn: Connection::open_in_memory()?,
        };
        storage.ensure_schema()?;
        Ok(storage)
    }
}

impl Storage for SqliteStorage {
    fn ensure_schema(&mut self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }

    fn insert_batch(&mut self, records: &[Record]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO hn_posts
                 (item_id, title, url, points, author, age_text, comments_link, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for record in records {
                inserted += stmt.execute(params![
                    record.item_id,
                    record.title,
                    record.url,
                    record.points,
                    record.author,
                    record.age_text,
                    record.comments_link,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM hn_posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn get(&self, item_id: &str) -> StorageResult<Option<StoredRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, item_id, title, url, points, author, age_text, comments_link, scraped_at
                 FROM hn_posts WHERE item_id = ?1",
                params![item_id],
                |row| {
                    let record = Record {
                        item_id: row.get(1)?,
                        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        url: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        points: row.get::<_, Option<u32>>(4)?.unwrap_or(0),
                        author: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                        age_text: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                        comments_link: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    };
                    Ok((row.get::<_, i64>(0)?, record, row.get::<_, String>(8)?))
                },
            )
            .optional()?;

        let Some((id, record, scraped_at)) = row else {
            return Ok(None);
        };

        let scraped_at = DateTime::parse_from_rfc3339(&scraped_at)
            .map_err(|_| StorageError::Timestamp {
                item_id: record.item_id.clone(),
                value: scraped_at.clone(),
            })?
            .with_timezone(&Utc);

        Ok(Some(StoredRecord {
            id,
            record,
            scraped_at,
        }))
    }
}
