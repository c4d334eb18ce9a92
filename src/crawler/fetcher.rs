//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Robots policy checks before any network call
//! - Per-host rate limiting through the shared ledger
//! - Retry with exponential backoff for transient failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::clock::Clock;
use crate::crawler::rate_limit::HostRateLimiter;
use crate::robots::RobotsCache;
use crate::url::host_key;
use crate::FetchError;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Outcome of fetching one URL
///
/// Produced for every URL the crawler attempted, successful or not. Failed
/// pages carry the error and no content.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// URL as requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub fetched_at: DateTime<Utc>,
    /// HTTP status; None when no response was received
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    /// Response headers, lowercased names
    pub headers: BTreeMap<String, String>,
    pub raw_content: String,
    /// Absolute, deduplicated links in document order
    pub discovered_links: Vec<String>,
    pub extracted_fields: BTreeMap<String, serde_json::Value>,
    pub depth: u32,
    pub parent_url: Option<String>,
    #[serde(skip)]
    pub error: Option<FetchError>,
}

impl PageResult {
    /// Builds a failed result for a URL that produced no usable response
    pub fn failed(url: &Url, depth: u32, parent_url: Option<String>, error: FetchError) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            fetched_at: Utc::now(),
            status_code: None,
            content_type: None,
            headers: BTreeMap::new(),
            raw_content: String::new(),
            discovered_links: Vec::new(),
            extracted_fields: BTreeMap::new(),
            depth,
            parent_url,
            error: Some(error),
        }
    }

    /// True for a 2xx response with no recorded error
    pub fn is_success(&self) -> bool {
        self.error.is_none() && matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }

    /// True when the body is worth parsing as HTML
    ///
    /// A missing Content-Type is treated as HTML.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml") || ct.starts_with("text/plain")
            }
        }
    }

    /// Looks up a response header by lowercase name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Retry behavior for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before retry n is `base_backoff * 2^n`
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Builds the policy from crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.retry_base_ms),
        }
    }

    /// Backoff to wait before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Upper bound for any single request
///
/// # Example
///
/// ```no_run
/// use leadscout::config::UserAgentConfig;
/// use leadscout::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "Leadscout".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Robots-aware, rate-limited HTTP fetcher shared by all crawl workers
pub struct Fetcher {
    client: Client,
    robots: Arc<RobotsCache>,
    limiter: Arc<HostRateLimiter>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(
        client: Client,
        robots: Arc<RobotsCache>,
        limiter: Arc<HostRateLimiter>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            robots,
            limiter,
            clock,
            retry,
        }
    }

    /// Checks the host's robots policy, fetching it on first use
    pub async fn is_allowed(&self, url: &Url) -> bool {
        self.robots.is_allowed(url).await
    }

    /// Fetches a URL
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Disallowed by robots | `Err(Disallowed)`, no request sent |
    /// | HTTP 429 / 5xx | Retry with backoff, then a failed `PageResult` |
    /// | Other HTTP 4xx | Failed `PageResult`, not retried |
    /// | Timeout | Retry with backoff, then `Err(Timeout)` |
    /// | Connection / DNS failure | `Err(NetworkError)`, not retried |
    ///
    /// Every attempt, retries included, goes through the per-host ledger.
    ///
    /// # Returns
    ///
    /// * `Ok(PageResult)` - A response was received (any status)
    /// * `Err(FetchError)` - No response could be obtained
    pub async fn fetch(
        &self,
        url: &Url,
        timeout: Duration,
        headers: &HeaderMap,
    ) -> Result<PageResult, FetchError> {
        if !self.robots.is_allowed(url).await {
            return Err(FetchError::Disallowed {
                url: url.to_string(),
            });
        }

        let host = host_key(url).unwrap_or_default();
        let crawl_delay = self.robots.crawl_delay(url).await;
        let mut attempt = 0;

        loop {
            self.limiter.acquire(&host, crawl_delay).await;

            let err = match self.send(url, timeout, headers).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if status == 429 {
                        self.limiter.record_throttled(&host);
                    }
                    let error = (!response.status().is_success()).then(|| FetchError::HttpError {
                        url: url.to_string(),
                        status,
                    });
                    match error {
                        Some(err) if err.is_transient() && attempt < self.retry.max_retries => err,
                        error => return self.read_response(url, response, error).await,
                    }
                }
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= self.retry.max_retries {
                return Err(err);
            }

            let backoff = self.retry.backoff(attempt);
            tracing::debug!(
                "Transient failure for {} ({}), retry {} in {:?}",
                url,
                err,
                attempt + 1,
                backoff
            );
            self.clock.sleep(backoff).await;
            attempt += 1;
        }
    }

    async fn send(
        &self,
        url: &Url,
        timeout: Duration,
        headers: &HeaderMap,
    ) -> Result<Response, FetchError> {
        self.client
            .get(url.clone())
            .headers(headers.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))
    }

    async fn read_response(
        &self,
        url: &Url,
        response: Response,
        error: Option<FetchError>,
    ) -> Result<PageResult, FetchError> {
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut page = PageResult {
            url: url.to_string(),
            final_url,
            fetched_at: Utc::now(),
            status_code: Some(status),
            content_type,
            headers,
            raw_content: String::new(),
            discovered_links: Vec::new(),
            extracted_fields: BTreeMap::new(),
            depth: 0,
            parent_url: None,
            error,
        };

        // Bodies of failed or non-HTML responses are not needed
        if page.error.is_none() && page.is_html() {
            page.raw_content = response.text().await.map_err(|e| classify_error(url, e))?;
        }

        Ok(page)
    }
}

/// Maps a reqwest failure onto the fetch error taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::NetworkError {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
