//! Trawl: a small concurrent web crawler feeding a search index
//!
//! This crate implements a bounded worker pool that fetches pages, extracts
//! text and outgoing links, deduplicates visited URLs, enforces a global
//! request rate limit and hands completed pages to a page store.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Errors returned to callers submitting work to a crawl engine
///
/// Fetch and store failures never surface here: they are logged and counted
/// per page so one bad URL cannot stop the crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Job queue is closed")]
    QueueClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Trawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlSummary, EngineConfig, FetchedPage, Fetcher, HttpFetcher};
pub use state::{EngineState, VisitedSet};
pub use storage::{PageStore, SqliteStorage};
pub use crate::url::normalize_url;
