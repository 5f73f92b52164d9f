//! Crawled item records
//!
//! A [`Record`] is what the extractor builds from one listing entry. Once the
//! store has accepted it, it comes back as a [`StoredRecord`] carrying the
//! row id and the insertion timestamp.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One listed item, as extracted from a page
///
/// Field order matches the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Source-assigned identifier, unique across the site
    pub item_id: String,

    /// Title text of the item link
    pub title: String,

    /// Absolute target URL of the item
    pub url: String,

    /// Score, 0 when missing
    pub points: u32,

    /// Submitter name, empty for deleted or anonymous items
    pub author: String,

    /// Relative age as displayed ("3 hours ago")
    pub age_text: String,

    /// Absolute URL of the discussion thread, empty if absent
    pub comments_link: String,
}

/// A record as persisted in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Synthetic row id, distinct from `item_id`
    pub id: i64,
    pub record: Record,
    /// Set by the store when the row was first inserted
    pub scraped_at: DateTime<Utc>,
}

/// Column headers used by every export format
pub const EXPORT_COLUMNS: [&str; 7] = [
    "item_id",
    "title",
    "url",
    "points",
    "author",
    "age_text",
    "comments_link",
];

#[cfg(test)]
pub(crate) fn sample_record(item_id: &str) -> Record {
    Record {
        item_id: item_id.to_string(),
        title: format!("Story {}", item_id),
        url: format!("https://example.com/{}", item_id),
        points: 42,
        author: "pg".to_string(),
        age_text: "2 hours ago".to_string(),
        comments_link: format!("https://news.ycombinator.com/item?id={}", item_id),
    }
}
