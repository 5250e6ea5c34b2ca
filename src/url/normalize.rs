use crate::UrlError;
use url::{form_urlencoded, Url};

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL into the canonical form used as its crawl identity
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme and a host
/// 3. Lowercase the host (done by the parser)
/// 4. Remove the fragment (everything after #)
/// 5. Remove tracking query parameters (`utm_*`, `fbclid`, `gclid`, `mc_eid`)
/// 6. Sort the remaining query parameters by key
/// 7. Remove an empty query string (trailing ?)
///
/// Scheme, `www.` prefix and trailing slashes are kept as-is: changing them
/// may point at a different resource.
///
/// # Examples
///
/// ```
/// use trawl::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/page?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !super::is_http_scheme(url.scheme()) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let query = filter_and_sort_query(query);
        url.set_query((!query.is_empty()).then_some(query.as_str()));
    }

    Ok(url)
}

/// Drops tracking parameters and sorts the rest by key
///
/// Segments are kept in their raw, still-encoded form: only the key is
/// decoded, for matching and ordering, so the query the server sees is the
/// one the page linked to.
fn filter_and_sort_query(query: &str) -> String {
    let mut segments: Vec<(String, &str)> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| (decode_key(segment), segment))
        .filter(|(key, _)| !is_tracking_param(key))
        .collect();

    // Stable sort keeps repeated keys in their original order
    segments.sort_by(|a, b| a.0.cmp(&b.0));

    segments
        .into_iter()
        .map(|(_, segment)| segment)
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_key(segment: &str) -> String {
    let raw_key = segment.split_once('=').map_or(segment, |(key, _)| key);
    form_urlencoded::parse(raw_key.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
