//! Statistics generation from the page database
//!
//! This module provides functionality for extracting and displaying
//! statistics about stored pages and about a finished crawl run.

use crate::crawler::CrawlSummary;
use crate::storage::{SqliteStorage, StorageResult};

/// Summary of what the page database holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatistics {
    /// Total number of stored pages
    pub total_pages: u64,

    /// Pages that have a non-empty title
    pub titled_pages: u64,

    /// Timestamp of the most recent store (RFC 3339)
    pub latest_crawl: Option<String>,
}

impl StoreStatistics {
    /// Share of stored pages with a title, as a percentage
    pub fn titled_percentage(&self) -> f64 {
        if self.total_pages > 0 {
            (self.titled_pages as f64 / self.total_pages as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The page database to query
pub fn load_statistics(storage: &SqliteStorage) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        total_pages: storage.count_pages()?,
        titled_pages: storage.count_titled()?,
        latest_crawl: storage.latest_crawl_time()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Page Store Statistics ===\n");

    println!("Overview:");
    println!("  Total pages stored: {}", stats.total_pages);
    println!(
        "  Pages with a title: {} ({:.1}%)",
        stats.titled_pages,
        stats.titled_percentage()
    );
    println!(
        "  Last crawled: {}",
        stats.latest_crawl.as_deref().unwrap_or("never")
    );
}

/// Prints the totals of a finished crawl run
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Jobs:");
    println!("  Enqueued: {}", summary.jobs_enqueued);
    println!("  Rejected: {}", summary.jobs_rejected);
    println!("  Duplicates skipped: {}", summary.duplicates_skipped);
    println!();

    println!("Pages:");
    println!("  Fetched: {}", summary.pages_fetched);
    println!("  Fetch failures: {}", summary.fetch_failures);
    println!("  Stored: {}", summary.pages_stored);
    println!("  Store failures: {}", summary.store_failures);
    println!("  Links discovered: {}", summary.links_discovered);
    println!();

    let attempted = summary.pages_fetched + summary.fetch_failures;
    let success_rate = if attempted > 0 {
        (summary.pages_stored as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} fetch attempts stored)",
        success_rate, summary.pages_stored, attempted
    );
}
