//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Trawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawled URL; re-crawls overwrite in place
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    body TEXT NOT NULL DEFAULT '',
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_crawled_at ON pages(crawled_at);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
