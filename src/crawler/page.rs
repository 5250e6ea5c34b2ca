/// A crawled page on its way from a worker to the page store
///
/// Produced by exactly one worker and moved through the result queue; the
/// collector owns it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Normalized URL the page was fetched from
    pub url: String,
    /// Text of the first `<title>` element, empty if absent
    pub title: String,
    /// Visible text with whitespace collapsed
    pub body: String,
}
