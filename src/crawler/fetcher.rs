//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests under a deadline and the crawl's cancellation token
//! - Content-Type and body size checks
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Longest time spent establishing a connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Reasons a URL could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Content-Type is not HTML: {0}")]
    ContentMismatch(String),

    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Fetch cancelled")]
    Cancelled,
}

/// A fetched body together with the URL it was finally served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Location after redirects; relative links resolve against it
    pub final_url: String,
    pub body: Vec<u8>,
}

/// Retrieves raw page bytes
///
/// Any failure, including a non-success status, means the URL is
/// unfetchable. Implementations must stop promptly once `cancel` fires.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, cancel: &CancellationToken, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Like `fetch`, but also reports where the body came from
    ///
    /// Fetchers that follow redirects override this; the default assumes
    /// the body was served from `url` itself.
    async fn fetch_page(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<FetchResponse, FetchError> {
        let body = self.fetch(cancel, url).await?;
        Ok(FetchResponse {
            final_url: url.to_string(),
            body,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Deadline for a whole request, body included
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use trawl::config::UserAgentConfig;
/// use trawl::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "Trawl".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production fetcher backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawler and user agent configuration
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            user_agent,
            Duration::from_secs(crawler.fetch_timeout_secs),
        )?;
        Ok(Self::with_client(client, crawler.max_body_bytes))
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client, max_body_bytes: usize) -> Self {
        Self {
            client,
            max_body_bytes,
        }
    }

    async fn fetch_response(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let mut response = self.client.get(url).send().await.map_err(classify_error)?;
        let final_url = response.url().to_string();

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // A missing header is given the benefit of the doubt
        if let Some(value) = response.headers().get(CONTENT_TYPE) {
            let content_type = value.to_str().unwrap_or_default();
            if !is_html_content_type(content_type) {
                return Err(FetchError::ContentMismatch(content_type.to_string()));
            }
        }

        let limit = self.max_body_bytes;
        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(FetchError::BodyTooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify_error)? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchResponse { final_url, body })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, cancel: &CancellationToken, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetch_page(cancel, url)
            .await
            .map(|response| response.body)
    }

    async fn fetch_page(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<FetchResponse, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.fetch_response(url) => result,
        }
    }
}

/// Returns true for `text/html` and `application/xhtml+xml`, ignoring parameters
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();

    mime.eq_ignore_ascii_case("text/html") || mime.eq_ignore_ascii_case("application/xhtml+xml")
}

fn classify_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config, Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_http_fetcher_from_config() {
        let fetcher = HttpFetcher::new(&CrawlerConfig::default(), &create_test_config());
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_html_content_types() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("TEXT/HTML"));
        assert!(is_html_content_type("application/xhtml+xml"));

        assert!(!is_html_content_type("application/json"));
        assert!(!is_html_content_type("image/png"));
        assert!(!is_html_content_type(""));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_returns_cancelled() {
        let fetcher = HttpFetcher::new(&CrawlerConfig::default(), &create_test_config()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = fetcher.fetch(&cancel, "http://127.0.0.1:9/").await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    // Responses from a live server are covered by the wiremock integration tests
}
