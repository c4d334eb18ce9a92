//! Search collaborator used to seed search and discover crawls
//!
//! The default implementation reads DuckDuckGo's HTML results page.

use crate::SearchError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Returns candidate URLs for a query, best first
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<Url>, SearchError>;
}

/// DuckDuckGo HTML search
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    /// Creates a search client against `endpoint` (the `/html/` results page)
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<Url>, SearchError> {
        tracing::debug!("DuckDuckGo search: {}", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("kl", "us-en")])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let results = parse_results(&html, num_results);
        tracing::debug!("Parsed {} results for '{}'", results.len(), query);
        Ok(results)
    }
}

/// Parses result links from a DuckDuckGo HTML page
///
/// Results live in `<a class="result__a">` elements. Redirect links carry the
/// target in the `uddg` parameter.
pub fn parse_results(html: &str, num_results: usize) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a.result__a") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(result_target)
        .filter(|url| seen.insert(url.to_string()))
        .take(num_results)
        .collect()
}

fn result_target(href: &str) -> Option<Url> {
    let href = href.trim();
    let absolute = if href.starts_with("//") {
        Url::parse(&format!("https:{}", href)).ok()?
    } else if href.starts_with('/') {
        Url::parse("https://duckduckgo.com").ok()?.join(href).ok()?
    } else {
        Url::parse(href).ok()?
    };

    let target = match absolute.query_pairs().find(|(key, _)| key == "uddg") {
        Some((_, value)) => Url::parse(&value).ok()?,
        None => absolute,
    };

    matches!(target.scheme(), "http" | "https").then_some(target)
}
