//! Storage traits and error types
//!
//! This module defines the interface the crawl engine persists pages through
//! and the associated error types.

use crate::crawler::FetchedPage;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Sink for completed pages
///
/// The crawl engine's collector calls `store_page` once per fetched page.
/// Implementations must be shareable across tasks; the engine never reads
/// back through this trait.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Persists a page and returns its durable identifier
    ///
    /// Storing a URL that is already present replaces its title and body.
    async fn store_page(&self, page: &FetchedPage) -> StorageResult<i64>;
}
