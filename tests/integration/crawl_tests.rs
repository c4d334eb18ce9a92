//! End-to-end crawl tests against a mock site

use crate::common::*;
use leadscout::crawler::{CancellationFlag, CrawlTask, ManualClock};
use leadscout::extract::FieldExtractor;
use leadscout::CrawlStatus;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_page_budget_bounds_breadth_first_crawl() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/p1", "/p2", "/p3", "/p4", "/p5"]).await;
    mount_page(&server, "/p1", "first").await;
    mount_page(&server, "/p2", "second").await;
    for route in ["/p3", "/p4", "/p5"] {
        mount_never(&server, route).await;
    }

    let crawler = crawler(Arc::new(ManualClock::new()), None, None);
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(3)
        .with_max_depth(1);
    let report = crawler.run(&task).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(fetched_paths(report.fetched_urls()), vec!["/", "/p1", "/p2"]);
    assert_eq!(report.discarded, 3);
    assert!(report.leads.is_empty());
}

#[tokio::test]
async fn test_levels_are_visited_in_parent_order() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/a", "/b"]).await;
    mount_links(&server, "/a", &["/a1"]).await;
    mount_links(&server, "/b", &["/b1"]).await;
    mount_page(&server, "/a1", "leaf").await;
    mount_page(&server, "/b1", "leaf").await;

    let crawler = crawler(Arc::new(ManualClock::new()), None, None);
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(20)
        .with_max_depth(2);
    let report = crawler.run(&task).await.unwrap();

    assert_eq!(
        fetched_paths(report.fetched_urls()),
        vec!["/", "/a", "/b", "/a1", "/b1"]
    );
    let depths: Vec<u32> = report.pages.iter().map(|page| page.depth).collect();
    assert_eq!(depths, vec![0, 1, 1, 2, 2]);

    let a1 = &report.pages[3];
    assert_eq!(a1.parent_url.as_deref(), Some(report.pages[1].url.as_str()));
    assert!(report.pages[0].parent_url.is_none());
}

#[tokio::test]
async fn test_cycles_are_fetched_once() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/a"]).await;
    mount_links(&server, "/a", &["/", "/b"]).await;
    mount_links(&server, "/b", &["/a", "/"]).await;

    let crawler = crawler(Arc::new(ManualClock::new()), None, None);
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(20)
        .with_max_depth(5);
    let report = crawler.run(&task).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(fetched_paths(report.fetched_urls()), vec!["/", "/a", "/b"]);
    assert_eq!(report.discarded, 0);
}

#[tokio::test]
async fn test_robots_disallowed_pages_are_never_fetched() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private/\n").await;
    mount_links(&server, "/", &["/public", "/private/secret"]).await;
    mount_page(&server, "/public", "hello").await;
    mount_never(&server, "/private/secret").await;

    let crawler = crawler(Arc::new(ManualClock::new()), None, None);
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(10)
        .with_max_depth(1);
    let report = crawler.run(&task).await.unwrap();

    let secret = format!("{}/private/secret", server.uri());
    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(fetched_paths(report.fetched_urls()), vec!["/", "/public"]);
    assert_eq!(report.disallowed, vec![secret.clone()]);
    assert!(report.pages[0].discovered_links.contains(&secret));
}

#[tokio::test]
async fn test_requests_to_one_host_are_spaced() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/a", "/b", "/c"]).await;
    for route in ["/a", "/b", "/c"] {
        mount_page(&server, route, "leaf").await;
    }

    let clock = Arc::new(ManualClock::new());
    let crawler = crawler(clock.clone(), None, None);
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(10)
        .with_max_depth(1);
    let report = crawler.run(&task).await.unwrap();
    assert_eq!(report.fetched_count(), 4);

    let mut slots = clock.waits();
    slots.sort();
    assert_eq!(slots.len(), 4);
    for pair in slots.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(1000));
    }
}

#[tokio::test]
async fn test_failed_pages_do_not_abort_the_crawl() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/broken", "/missing", "/fine"]).await;
    mount_page(&server, "/fine", "fine").await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let crawler = crawler(clock.clone(), None, None);
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(10)
        .with_max_depth(1);
    let report = crawler.run(&task).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.fetched_count(), 4);
    assert_eq!(report.failed_count(), 2);
    let statuses: Vec<Option<u16>> = report.pages.iter().map(|page| page.status_code).collect();
    assert_eq!(statuses, vec![Some(200), Some(500), Some(404), Some(200)]);
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_millis(500), Duration::from_millis(1000)]
    );
}

#[tokio::test]
async fn test_unreachable_seed_fails_the_crawl() {
    let crawler = crawler(Arc::new(ManualClock::new()), None, None);
    let task = CrawlTask::single("http://127.0.0.1:9/");
    let report = crawler.run(&task).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Failed);
    assert_eq!(report.failed_count(), 1);
    assert!(report.leads.is_empty());
}

#[tokio::test]
async fn test_cancellation_stops_dispatch() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/a", "/b"]).await;
    mount_never(&server, "/a").await;
    mount_never(&server, "/b").await;

    let flag = CancellationFlag::new();
    let extractor: Arc<dyn FieldExtractor> = Arc::new(CancellingExtractor { flag: flag.clone() });
    let crawler = crawler(Arc::new(ManualClock::new()), Some(extractor), None);
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(10)
        .with_max_depth(2);
    let report = crawler.run_with_cancellation(&task, &flag).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Cancelled);
    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.discarded, 2);
}

#[tokio::test]
async fn test_leads_come_from_identified_pages() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/about", "/blog"]).await;
    mount_page(&server, "/about", "About Acme Analytics, contact sales@acme.io").await;
    mount_page(&server, "/blog", "Nothing to see").await;

    let extractor = Arc::new(DirectoryExtractor::new().with_company(
        "Acme Analytics",
        json!({
            "company_name": "Acme Analytics",
            "contact_email": "sales@acme.io",
            "industry": "SaaS",
            "technologies": ["React", "Stripe"]
        }),
    ));
    let crawler = crawler(
        Arc::new(ManualClock::new()),
        Some(extractor.clone() as Arc<dyn FieldExtractor>),
        None,
    );
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(10)
        .with_max_depth(1);
    let report = crawler.run(&task).await.unwrap();

    assert_eq!(extractor.calls(), 3);
    assert_eq!(report.leads.len(), 1);
    let lead = &report.leads[0];
    assert_eq!(lead.company_name.as_deref(), Some("Acme Analytics"));
    assert_eq!(lead.crawl_depth, 1);
    assert!(lead.source_url.ends_with("/about"));
    assert!(lead.technologies.contains("react"));
}

#[tokio::test]
async fn test_unavailable_extractor_degrades_to_links() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/a"]).await;
    mount_page(&server, "/a", "Acme").await;

    let extractor: Arc<dyn FieldExtractor> = Arc::new(UnavailableExtractor);
    let crawler = crawler(Arc::new(ManualClock::new()), Some(extractor), None);
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(10)
        .with_max_depth(1);
    let report = crawler.run(&task).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.fetched_count(), 2);
    assert!(report.leads.is_empty());
}

#[tokio::test]
async fn test_map_builds_site_tree_without_extraction() {
    let server = MockServer::start().await;
    mount_links(&server, "/", &["/pricing", "/about"]).await;
    mount_links(&server, "/pricing", &["/pricing/enterprise"]).await;
    mount_page(&server, "/about", "about").await;
    mount_page(&server, "/pricing/enterprise", "enterprise").await;

    let extractor = Arc::new(DirectoryExtractor::new());
    let crawler = crawler(
        Arc::new(ManualClock::new()),
        Some(extractor.clone() as Arc<dyn FieldExtractor>),
        None,
    );
    let task = CrawlTask::map(server.uri())
        .with_max_pages(10)
        .with_max_depth(2);
    let report = crawler.run(&task).await.unwrap();

    assert_eq!(extractor.calls(), 0);
    assert!(report.leads.is_empty());

    let site_map = report.site_map.expect("map crawls produce a site map");
    assert_eq!(site_map.len(), 4);
    assert_eq!(site_map.roots().count(), 1);

    let root = format!("{}/", server.uri());
    let pricing = format!("{}/pricing", server.uri());
    assert_eq!(site_map.get(&root).unwrap().children.len(), 2);
    assert_eq!(
        site_map.get(&pricing).unwrap().children,
        vec![format!("{}/pricing/enterprise", server.uri())]
    );
}
