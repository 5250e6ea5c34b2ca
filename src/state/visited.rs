//! Concurrent visited-URL set

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Set of URLs already claimed by a worker
///
/// This is the only place that decides whether a URL gets crawled.
/// Membership is permanent for the lifetime of the set; there is no eviction.
#[derive(Debug, Default)]
pub struct VisitedSet {
    items: Mutex<HashSet<String>>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `url` if it is not already present
    ///
    /// Returns true iff this call performed the insertion. The membership
    /// check and the insert happen under one lock acquisition, so two callers
    /// racing on the same URL cannot both see `true`.
    pub fn add_if_absent(&self, url: &str) -> bool {
        let mut items = self.lock();
        if items.contains(url) {
            return false;
        }
        items.insert(url.to_string())
    }

    /// Returns true if `url` has been claimed
    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// Number of distinct URLs claimed so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the set half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
