//! Crawl, score and store: the full path from web pages to ranked leads

use crate::common::*;
use leadscout::crawler::{CrawlReport, CrawlTask, ManualClock};
use leadscout::extract::FieldExtractor;
use leadscout::storage::{open_store, LeadSink};
use leadscout::{CrawlStatus, Grade, IcpConfig, LeadPipeline};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

fn icp() -> IcpConfig {
    IcpConfig {
        company_sizes: ["51-200".to_string()].into_iter().collect(),
        industries: ["saas".to_string()].into_iter().collect(),
        technologies: ["react".to_string(), "stripe".to_string()].into_iter().collect(),
        ..IcpConfig::default()
    }
}

/// Crawls a two-company site and returns the report
async fn crawl_companies(server: &MockServer) -> CrawlReport {
    mount_links(server, "/", &["/acme", "/globex"]).await;
    mount_page(
        server,
        "/acme",
        "Acme Analytics builds dashboards. See our pricing or book a demo.",
    )
    .await;
    mount_page(server, "/globex", "Globex sells retail hardware.").await;

    let extractor = DirectoryExtractor::new()
        .with_company(
            "Acme Analytics",
            json!({
                "company_name": "Acme Analytics",
                "contact_email": "Sales@Acme.io",
                "industry": "B2B SaaS",
                "company_size": "120 employees",
                "technologies": ["React", "Stripe"],
                "website": "https://acme.io"
            }),
        )
        .with_company(
            "Globex",
            json!({
                "company_name": "Globex",
                "industry": "Retail",
                "company_size": "5",
                "website": "https://globex.com"
            }),
        );

    let crawler = crawler(
        Arc::new(ManualClock::new()),
        Some(Arc::new(extractor) as Arc<dyn FieldExtractor>),
        None,
    );
    let task = CrawlTask::crawl(server.uri())
        .with_max_pages(10)
        .with_max_depth(1);
    crawler.run(&task).await.unwrap()
}

#[tokio::test]
async fn test_crawl_results_are_scored_and_stored() {
    let server = MockServer::start().await;
    let report = crawl_companies(&server).await;
    assert_eq!(report.leads.len(), 2);

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("leads.db");
    let mut store = open_store(&db_path).unwrap();
    let pipeline = LeadPipeline::new(icp()).unwrap();
    let (run_id, scored) = pipeline.deliver(&report, &mut store, "abc123").unwrap();

    assert_eq!(scored[0].lead.company_name.as_deref(), Some("Acme Analytics"));
    assert_eq!(scored[0].lead.contact_email.as_deref(), Some("sales@acme.io"));
    assert_eq!(scored[0].score.fit, 100.0);
    assert!(scored[0].score.composite > scored[1].score.composite);
    assert_eq!(scored[1].score.grade, Grade::F);
    drop(store);

    let store = open_store(&db_path).unwrap();
    let run = store.get_run(run_id).unwrap();
    assert_eq!(run.mode, "crawl");
    assert_eq!(run.config_hash, "abc123");
    assert_eq!(run.status, CrawlStatus::Completed);
    assert_eq!(run.pages_fetched, 3);
    assert_eq!(run.pages_failed, 0);
    assert_eq!(run.leads_found, 2);

    let leads = store.leads_for_run(run_id).unwrap();
    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0].company_name.as_deref(), Some("Acme Analytics"));
    assert_eq!(leads[0].company_size, "51-200");
    assert_eq!(leads[0].technologies, vec!["react", "stripe"]);
    assert_eq!(leads[0].composite, scored[0].score.composite);
    assert_eq!(leads[1].company_size, "1-10");
}

#[tokio::test]
async fn test_redelivery_replaces_stored_leads() {
    let server = MockServer::start().await;
    let report = crawl_companies(&server).await;

    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir.path().join("leads.db")).unwrap();
    let pipeline = LeadPipeline::new(icp()).unwrap();

    let (first, first_scores) = pipeline.deliver(&report, &mut store, "abc123").unwrap();
    let (second, second_scores) = pipeline.deliver(&report, &mut store, "abc123").unwrap();

    assert_ne!(first, second);
    assert_eq!(store.count_leads().unwrap(), 2);
    assert!(store.leads_for_run(first).unwrap().is_empty());
    assert_eq!(store.leads_for_run(second).unwrap().len(), 2);

    let composites = |scored: &[leadscout::ScoredLead]| -> Vec<u8> {
        scored.iter().map(|entry| entry.score.composite).collect()
    };
    assert_eq!(composites(&first_scores), composites(&second_scores));
}
