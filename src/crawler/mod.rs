//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling pipeline, including:
//! - HTTP fetching behind the `Fetcher` trait
//! - HTML parsing and link extraction
//! - Global rate limiting
//! - The crawl engine's worker pool and result collector

mod engine;
mod fetcher;
mod limiter;
mod page;
mod parser;
mod queue;
mod stats;

pub use engine::{CrawlEngine, EngineConfig, JobSender};
pub use fetcher::{
    build_http_client, is_html_content_type, FetchError, FetchResponse, Fetcher, HttpFetcher,
};
pub use limiter::{Cancelled, RateLimiter};
pub use page::FetchedPage;
pub use parser::{parse_page, resolve_link, ParsedPage};
pub use queue::{QueueClosed, WorkQueue};
pub use stats::{CrawlStats, CrawlSummary};
