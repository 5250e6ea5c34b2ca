//! Counters kept by a crawl engine

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the workers and the collector
#[derive(Debug, Default)]
pub struct CrawlStats {
    jobs_enqueued: AtomicU64,
    jobs_rejected: AtomicU64,
    duplicates_skipped: AtomicU64,
    pages_fetched: AtomicU64,
    fetch_failures: AtomicU64,
    links_discovered: AtomicU64,
    pages_stored: AtomicU64,
    store_failures: AtomicU64,
}

macro_rules! counter {
    ($record:ident, $field:ident) => {
        pub(crate) fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl CrawlStats {
    counter!(record_enqueued, jobs_enqueued);
    counter!(record_rejected, jobs_rejected);
    counter!(record_duplicate, duplicates_skipped);
    counter!(record_fetched, pages_fetched);
    counter!(record_fetch_failure, fetch_failures);
    counter!(record_stored, pages_stored);
    counter!(record_store_failure, store_failures);

    pub(crate) fn record_links(&self, count: usize) {
        self.links_discovered
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> CrawlSummary {
        CrawlSummary {
            jobs_enqueued: self.jobs_enqueued.load(Ordering::Relaxed),
            jobs_rejected: self.jobs_rejected.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            pages_stored: self.pages_stored.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// Totals for one engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Jobs accepted into the queue
    pub jobs_enqueued: u64,
    /// Jobs refused because the queue was closed or the URL was invalid
    pub jobs_rejected: u64,
    /// Dequeued URLs that had already been visited
    pub duplicates_skipped: u64,
    pub pages_fetched: u64,
    pub fetch_failures: u64,
    /// Links found on fetched pages, before deduplication
    pub links_discovered: u64,
    pub pages_stored: u64,
    pub store_failures: u64,
}
