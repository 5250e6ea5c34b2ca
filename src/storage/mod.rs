//! Storage module for persisting crawled pages
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Page persistence (the crawl engine's sink)
//! - The read side used by search and statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{PageStore, StorageError, StorageResult};

/// Represents a stored page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub body: String,
    /// RFC 3339 timestamp of the last successful crawl
    pub crawled_at: String,
}
