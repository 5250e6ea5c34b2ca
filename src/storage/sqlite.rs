//! SQLite storage implementation
//!
//! This module provides a SQLite-backed `PageStore` plus the read-side
//! queries used by search and statistics.

use crate::crawler::FetchedPage;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use crate::storage::PageRecord;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const PAGE_COLUMNS: &str = "id, url, title, body, crawled_at";

/// SQLite storage backend
///
/// The connection sits behind a mutex so one storage value can be shared
/// between the collector task and readers.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates a database file and applies the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Inserts a page, or overwrites title, body and crawl time if the URL
    /// is already stored. The row id is stable across re-crawls.
    pub fn upsert_page(&self, page: &FetchedPage) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let id = conn.query_row(
            "INSERT INTO pages (url, title, body, crawled_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                crawled_at = excluded.crawled_at
             RETURNING id",
            params![page.url, page.title, page.body, now],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Gets a page by ID
    pub fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
            params![page_id],
            page_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::PageNotFound(format!("Page ID {}", page_id)))
    }

    /// Gets a page by URL
    pub fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let conn = self.lock()?;
        let page = conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE url = ?1", PAGE_COLUMNS),
                params![url],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    /// Gets total page count
    pub fn count_pages(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Counts pages that have a non-empty title
    pub fn count_titled(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM pages WHERE title != ''", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Timestamp of the most recent store, if any page exists
    pub fn latest_crawl_time(&self) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        let latest: Option<String> =
            conn.query_row("SELECT MAX(crawled_at) FROM pages", [], |row| row.get(0))?;
        Ok(latest)
    }

    /// Searches stored pages
    ///
    /// Every whitespace-separated term must appear (case-insensitively) in
    /// the title or the body. Pages whose title contains the first term rank
    /// first, then the most recently crawled.
    pub fn search_pages(&self, query: &str, limit: usize) -> StorageResult<Vec<PageRecord>> {
        let patterns: Vec<String> = query
            .split_whitespace()
            .map(|term| format!("%{}%", escape_like(term)))
            .collect();

        if patterns.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let conditions = (1..=patterns.len())
            .map(|i| {
                format!(
                    r"(title LIKE ?{i} ESCAPE '\' OR body LIKE ?{i} ESCAPE '\')",
                    i = i
                )
            })
            .collect::<Vec<_>>()
            .join(" AND ");

        let sql = format!(
            r"SELECT {} FROM pages WHERE {}
             ORDER BY (title LIKE ?1 ESCAPE '\') DESC, crawled_at DESC, id DESC
             LIMIT ?{}",
            PAGE_COLUMNS,
            conditions,
            patterns.len() + 1
        );

        // SQLite limits are signed; anything larger means "no limit"
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut values: Vec<Value> = patterns.into_iter().map(Value::Text).collect();
        values.push(Value::Integer(limit));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let pages = stmt
            .query_map(params_from_iter(values), page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }
}

#[async_trait]
impl PageStore for SqliteStorage {
    async fn store_page(&self, page: &FetchedPage) -> StorageResult<i64> {
        self.upsert_page(page)
    }
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        crawled_at: row.get(4)?,
    })
}

/// Escapes LIKE wildcards so search terms match literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
