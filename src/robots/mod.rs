//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt
//! files. Policies are cached per crawl and consulted before every page fetch.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use async_trait::async_trait;
use reqwest::Client;

/// Source of robots policies, one call per host per crawl
///
/// Implementations never fail: a missing or unreachable robots.txt yields an
/// allow-all policy.
#[async_trait]
pub trait RobotsSource: Send + Sync {
    /// Retrieves the policy for `origin` (`scheme://host[:port]`)
    async fn fetch_policy(&self, origin: &str) -> ParsedRobots;
}

/// Fetches `/robots.txt` over HTTP
pub struct HttpRobotsSource {
    client: Client,
}

impl HttpRobotsSource {
    /// Creates a source using a shared HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RobotsSource for HttpRobotsSource {
    /// Fetches robots.txt for an origin
    ///
    /// # Returns
    ///
    /// * Parsed content for a 2xx response
    /// * `ParsedRobots::allow_all()` for 4xx, 5xx, or any transport failure
    async fn fetch_policy(&self, origin: &str) -> ParsedRobots {
        let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));

        let response = match self.client.get(&robots_url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("robots.txt unreachable at {}: {}", robots_url, e);
                return ParsedRobots::allow_all();
            }
        };

        if !response.status().is_success() {
            tracing::debug!(
                "robots.txt at {} returned HTTP {}, allowing all",
                robots_url,
                response.status().as_u16()
            );
            return ParsedRobots::allow_all();
        }

        match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::debug!("Failed to read robots.txt body at {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    }
}
