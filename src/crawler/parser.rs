//! HTML parser for extracting page text and links
//!
//! This module turns fetched bytes into:
//! - The page title (first `<title>` element)
//! - Plain-text body with `script` and `style` content removed
//! - Outgoing http(s) links, resolved to absolute URLs

use crate::url::is_http_scheme;
use scraper::{Html, Node, Selector};
use url::Url;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Text of the first `<title>` element, trimmed; empty if absent
    pub title: String,

    /// Visible text with whitespace runs collapsed to single spaces
    pub body: String,

    /// Absolute http(s) URLs of every `<a href>` on the page
    pub links: Vec<String>,
}

/// Parses fetched bytes into title, body text and links
///
/// Parsing never fails. Bytes that are not UTF-8, or that contain no markup
/// at all, yield an empty page. Truncated or malformed markup goes through
/// the error-tolerant HTML5 parser and whatever survives is returned.
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` targets, resolved against `base_url`, fragment removed
///
/// **Exclude:**
/// - Empty and fragment-only hrefs (same page anchors)
/// - `javascript:`, `mailto:`, `tel:`, `data:` and every other non-HTTP(S) scheme
/// - Hrefs that fail to resolve
///
/// # Example
///
/// ```
/// use trawl::crawler::parse_page;
/// use url::Url;
///
/// let html = br#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(&base_url, html);
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_page(base_url: &Url, bytes: &[u8]) -> ParsedPage {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let html = match std::str::from_utf8(bytes) {
        Ok(html) if html.contains('<') => html,
        _ => return ParsedPage::default(),
    };

    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        body: extract_body_text(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Collects every text node outside `script` and `style` subtrees
fn extract_body_text(document: &Html) -> String {
    let mut text = String::new();
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(fragment) => {
                text.push_str(fragment);
                text.push(' ');
            }
            Node::Element(element) if matches!(element.name(), "script" | "style") => continue,
            _ => {}
        }
        // Reversed so the stack pops children in document order
        stack.extend(node.children().rev());
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(base_url, href))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - Empty and fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Example
///
/// ```
/// use trawl::crawler::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://a.com/x/y").unwrap();
/// assert_eq!(resolve_link(&base, "../z"), Some("https://a.com/z".to_string()));
/// assert_eq!(resolve_link(&base, "mailto:x@y.com"), None);
/// ```
pub fn resolve_link(base_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if !is_http_scheme(absolute_url.scheme()) {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
