//! Output module for reporting crawl results
//!
//! This module handles:
//! - Store statistics and end-of-run summaries
//! - Printing search results from the page database

pub mod stats;

pub use stats::{load_statistics, print_statistics, print_summary, StoreStatistics};

use crate::storage::PageRecord;

/// Characters of body text shown per search hit
const SNIPPET_CHARS: usize = 160;

/// Prints search hits to stdout, one block per page
pub fn print_search_results(query: &str, results: &[PageRecord]) {
    if results.is_empty() {
        println!("No pages match \"{}\"", query);
        return;
    }

    println!("{} result(s) for \"{}\":\n", results.len(), query);
    for (rank, page) in results.iter().enumerate() {
        let title = if page.title.is_empty() {
            "(untitled)"
        } else {
            page.title.as_str()
        };
        println!("{}. {}", rank + 1, title);
        println!("   {}", page.url);
        println!("   {}", snippet(&page.body, SNIPPET_CHARS));
        println!();
    }
}

/// Shortens `text` to at most `max_chars` characters, marking the cut
fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}
