//! URL handling module for Trawl
//!
//! Every job entering the crawl is normalized here first, so the visited
//! set compares canonical strings rather than spellings.

mod normalize;

pub use normalize::normalize_url;

/// Returns true for the schemes the crawler fetches
pub fn is_http_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}
