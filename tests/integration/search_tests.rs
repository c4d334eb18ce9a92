//! Search and discover crawls with a stub search provider

use crate::common::*;
use leadscout::crawler::{CrawlTask, ManualClock, SearchProvider};
use leadscout::extract::FieldExtractor;
use leadscout::CrawlStatus;
use serde_json::json;
use std::sync::Arc;
use wiremock::MockServer;

async fn company_site(server: &MockServer) -> Arc<DirectoryExtractor> {
    mount_page(server, "/acme", "Acme Analytics home").await;
    mount_page(server, "/acme-careers", "Careers at Acme Corp").await;
    mount_page(server, "/globex", "Globex Retail Systems").await;

    Arc::new(
        DirectoryExtractor::new()
            .with_company(
                "Acme Analytics",
                json!({"company_name": "Acme Analytics", "website": "https://acme.io"}),
            )
            .with_company(
                "Acme Corp",
                json!({"company_name": "Acme Corp", "website": "https://www.acme.io/careers"}),
            )
            .with_company(
                "Globex",
                json!({"company_name": "Globex", "website": "https://globex.com"}),
            ),
    )
}

fn results(server: &MockServer, routes: &[&str]) -> Vec<String> {
    routes
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect()
}

#[tokio::test]
async fn test_search_crawls_result_pages_only() {
    let server = MockServer::start().await;
    mount_links(&server, "/r1", &["/deeper"]).await;
    mount_page(&server, "/r2", "second result").await;
    mount_never(&server, "/r3").await;
    mount_never(&server, "/deeper").await;

    let search = Arc::new(PagedSearch::new(results(&server, &["/r1", "/r2", "/r3"])));
    let crawler = crawler(
        Arc::new(ManualClock::new()),
        None,
        Some(search.clone() as Arc<dyn SearchProvider>),
    );
    let report = crawler.run(&CrawlTask::search("saas tools", 2)).await.unwrap();

    assert_eq!(search.calls(), 1);
    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(fetched_paths(report.fetched_urls()), vec!["/r1", "/r2"]);
    assert!(report.pages.iter().all(|page| page.depth == 0));
}

#[tokio::test]
async fn test_search_failure_fails_the_crawl() {
    let crawler = crawler(Arc::new(ManualClock::new()), None, Some(Arc::new(BrokenSearch)));
    let report = crawler.run(&CrawlTask::search("saas tools", 5)).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Failed);
    assert!(report.pages.is_empty());
}

#[tokio::test]
async fn test_discover_search_failure_fails_the_crawl() {
    let crawler = crawler(Arc::new(ManualClock::new()), None, Some(Arc::new(BrokenSearch)));
    let report = crawler
        .run(&CrawlTask::discover("saas", "Berlin", 3))
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Failed);
    assert!(report.pages.is_empty());
    assert!(report.leads.is_empty());
}

#[tokio::test]
async fn test_discover_merges_duplicate_companies() {
    let server = MockServer::start().await;
    let extractor = company_site(&server).await;
    let search = Arc::new(PagedSearch::new(results(
        &server,
        &["/acme", "/acme-careers", "/globex"],
    )));
    let crawler = crawler(
        Arc::new(ManualClock::new()),
        Some(extractor as Arc<dyn FieldExtractor>),
        Some(search.clone() as Arc<dyn SearchProvider>),
    );

    let report = crawler
        .run(&CrawlTask::discover("saas", "Berlin", 3))
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(search.calls(), 4);
    assert_eq!(report.fetched_count(), 3);
    let names: Vec<&str> = report
        .leads
        .iter()
        .filter_map(|lead| lead.company_name.as_deref())
        .collect();
    assert_eq!(names, vec!["Acme Analytics", "Globex"]);
}

#[tokio::test]
async fn test_discover_stops_once_enough_leads() {
    let server = MockServer::start().await;
    mount_page(&server, "/acme", "Acme Analytics home").await;
    mount_never(&server, "/globex").await;

    let extractor = DirectoryExtractor::new().with_company(
        "Acme Analytics",
        json!({"company_name": "Acme Analytics", "website": "https://acme.io"}),
    );
    let search = Arc::new(PagedSearch::new(results(&server, &["/acme", "/globex"])));
    let crawler = crawler(
        Arc::new(ManualClock::new()),
        Some(Arc::new(extractor)),
        Some(search.clone() as Arc<dyn SearchProvider>),
    );

    let report = crawler
        .run(&CrawlTask::discover("saas", "Berlin", 1))
        .await
        .unwrap();

    assert_eq!(search.calls(), 1);
    assert_eq!(report.leads.len(), 1);
}
