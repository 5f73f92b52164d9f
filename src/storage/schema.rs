//! Database schema definitions
//!
//! This module contains the SQL schema for the HN-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per listed item, first write wins
CREATE TABLE IF NOT EXISTS hn_posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL UNIQUE,
    title TEXT,
    url TEXT,
    points INTEGER,
    author TEXT,
    age_text TEXT,
    comments_link TEXT,
    scraped_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// Safe to run against an existing database: nothing is dropped or rewritten.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
