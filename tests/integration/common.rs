//! Shared fixtures: mock sites, stub collaborators and crawler setup

use async_trait::async_trait;
use leadscout::config::{CrawlerConfig, UserAgentConfig};
use leadscout::crawler::{CancellationFlag, Crawler, ManualClock, SearchProvider};
use leadscout::extract::{ExtractionSchema, FieldExtractor};
use leadscout::{ExtractionError, SearchError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "bot@example.com".to_string(),
    }
}

pub fn crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        max_concurrent_workers: 4,
        request_timeout_secs: 5,
        ..CrawlerConfig::default()
    }
}

/// Builds a crawler on a virtual clock with the given collaborators
pub fn crawler(
    clock: Arc<ManualClock>,
    extractor: Option<Arc<dyn FieldExtractor>>,
    search: Option<Arc<dyn SearchProvider>>,
) -> Crawler {
    let mut builder = Crawler::builder(crawler_config(), user_agent()).clock(clock);
    if let Some(extractor) = extractor {
        builder = builder.field_extractor(extractor);
    }
    if let Some(search) = search {
        builder = builder.search_provider(search);
    }
    builder.build().expect("crawler builds")
}

/// Serves an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(format!("<html><body>{}</body></html>", body), "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Serves an HTML page whose links point at `links`
pub async fn mount_links(server: &MockServer, route: &str, links: &[&str]) {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">{}</a>"#, link, link))
        .collect();
    mount_page(server, route, &anchors).await;
}

/// Asserts that `route` is never requested
pub async fn mount_never(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Paths of the fetched pages, in dispatch order
pub fn fetched_paths(urls: Vec<&str>) -> Vec<String> {
    urls.into_iter()
        .filter_map(|url| Url::parse(url).ok())
        .map(|url| url.path().to_string())
        .collect()
}

/// Field extractor answering from a fixed directory of page markers
///
/// A page whose text contains a marker gets that marker's fields; other
/// pages get none.
pub struct DirectoryExtractor {
    entries: Vec<(String, BTreeMap<String, Value>)>,
    calls: AtomicUsize,
}

impl DirectoryExtractor {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_company(mut self, marker: &str, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        self.entries.push((marker.to_string(), fields));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FieldExtractor for DirectoryExtractor {
    async fn extract_fields(
        &self,
        text: &str,
        _schema: &ExtractionSchema,
    ) -> Result<BTreeMap<String, Value>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .iter()
            .find(|(marker, _)| text.contains(marker.as_str()))
            .map(|(_, fields)| fields.clone())
            .unwrap_or_default())
    }
}

/// Field extractor that requests cancellation the first time it runs
pub struct CancellingExtractor {
    pub flag: CancellationFlag,
}

#[async_trait]
impl FieldExtractor for CancellingExtractor {
    async fn extract_fields(
        &self,
        _text: &str,
        _schema: &ExtractionSchema,
    ) -> Result<BTreeMap<String, Value>, ExtractionError> {
        self.flag.cancel();
        Ok(BTreeMap::new())
    }
}

/// Field extractor that is always down
pub struct UnavailableExtractor;

#[async_trait]
impl FieldExtractor for UnavailableExtractor {
    async fn extract_fields(
        &self,
        _text: &str,
        _schema: &ExtractionSchema,
    ) -> Result<BTreeMap<String, Value>, ExtractionError> {
        Err(ExtractionError::CollaboratorUnavailable(
            "connection refused".to_string(),
        ))
    }
}

/// Search provider paging through a fixed result list, one page per call
pub struct PagedSearch {
    results: Vec<Url>,
    calls: AtomicUsize,
}

impl PagedSearch {
    pub fn new(results: Vec<String>) -> Self {
        Self {
            results: results
                .iter()
                .filter_map(|url| Url::parse(url).ok())
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for PagedSearch {
    async fn search(&self, _query: &str, num_results: usize) -> Result<Vec<Url>, SearchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .results
            .iter()
            .skip(call * num_results)
            .take(num_results)
            .cloned()
            .collect())
    }
}

/// Search provider that always fails
pub struct BrokenSearch;

#[async_trait]
impl SearchProvider for BrokenSearch {
    async fn search(&self, _query: &str, _num_results: usize) -> Result<Vec<Url>, SearchError> {
        Err(SearchError::Status(503))
    }
}
