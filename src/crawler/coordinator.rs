//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Seeding the frontier from a URL or the search collaborator
//! - Robots checks and page-budget accounting before dispatch
//! - A bounded worker pool running fetch, extract and enqueue per page
//! - Cooperative cancellation between units of work
//! - Lead aggregation for discover mode

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::clock::{Clock, SystemClock};
use crate::crawler::fetcher::{build_http_client, Fetcher, PageResult, RetryPolicy};
use crate::crawler::frontier::{Dispatch, Frontier, FrontierEntry, StopReason};
use crate::crawler::lead::Lead;
use crate::crawler::rate_limit::HostRateLimiter;
use crate::crawler::search::{DuckDuckGoSearch, SearchProvider};
use crate::crawler::site_map::SiteMap;
use crate::crawler::task::{discover_queries, CrawlMode, CrawlTask};
use crate::extract::{ExtractionSchema, Extractor, FieldExtractor, OpenAiExtractor};
use crate::robots::{HttpRobotsSource, RobotsCache, RobotsSource};
use crate::state::{CrawlLifecycle, CrawlStatus};
use crate::url::normalize_url;
use crate::{ConfigError, FetchError};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Shared stop flag for a running crawl
///
/// Cancellation is cooperative: the dispatcher checks the flag before every
/// dequeue, and in-flight pages are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub mode: CrawlMode,
    pub status: CrawlStatus,
    /// One result per attempted URL, in dispatch order
    pub pages: Vec<PageResult>,
    /// Lead candidates, in the order their pages were dispatched
    pub leads: Vec<Lead>,
    /// URLs skipped because robots.txt disallows them
    pub disallowed: Vec<String>,
    /// Present for map crawls
    pub site_map: Option<SiteMap>,
    /// Entries left in the frontier when the crawl stopped
    pub discarded: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn fetched_count(&self) -> usize {
        self.pages.len()
    }

    pub fn failed_count(&self) -> usize {
        self.pages.iter().filter(|page| !page.is_success()).count()
    }

    /// Requested URLs in dispatch order
    pub fn fetched_urls(&self) -> Vec<&str> {
        self.pages.iter().map(|page| page.url.as_str()).collect()
    }
}

/// Builder for `Crawler`, used to swap collaborators and the clock
pub struct CrawlerBuilder {
    config: CrawlerConfig,
    user_agent: UserAgentConfig,
    client: Option<Client>,
    clock: Arc<dyn Clock>,
    robots_source: Option<Arc<dyn RobotsSource>>,
    field_extractor: Option<Arc<dyn FieldExtractor>>,
    search: Option<Arc<dyn SearchProvider>>,
}

impl CrawlerBuilder {
    pub fn new(config: CrawlerConfig, user_agent: UserAgentConfig) -> Self {
        Self {
            config,
            user_agent,
            client: None,
            clock: Arc::new(SystemClock),
            robots_source: None,
            field_extractor: None,
            search: None,
        }
    }

    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn robots_source(mut self, source: Arc<dyn RobotsSource>) -> Self {
        self.robots_source = Some(source);
        self
    }

    pub fn field_extractor(mut self, extractor: Arc<dyn FieldExtractor>) -> Self {
        self.field_extractor = Some(extractor);
        self
    }

    pub fn search_provider(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn build(self) -> crate::Result<Crawler> {
        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let client = match self.client {
            Some(client) => client,
            None => build_http_client(&self.user_agent, timeout)?,
        };
        let robots_source = self
            .robots_source
            .unwrap_or_else(|| Arc::new(HttpRobotsSource::new(client.clone())));
        let limiter = Arc::new(HostRateLimiter::new(
            Duration::from_millis(self.config.min_host_interval_ms),
            Arc::clone(&self.clock),
        ));

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        Ok(Crawler {
            client,
            robots_source,
            agent: self.user_agent.crawler_name.clone(),
            limiter,
            clock: self.clock,
            retry: RetryPolicy::from_config(&self.config),
            extractor: Extractor::new(self.field_extractor),
            search: self.search,
            workers: self.config.max_concurrent_workers.max(1) as usize,
            request_timeout: timeout,
            headers,
            identifying_fields: Arc::from(self.config.identifying_fields),
        })
    }
}

/// Drives crawl tasks
///
/// The per-host rate-limit ledger lives as long as the crawler, so politeness
/// holds across consecutive tasks. Robots policies are cached per task.
pub struct Crawler {
    client: Client,
    robots_source: Arc<dyn RobotsSource>,
    agent: String,
    limiter: Arc<HostRateLimiter>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    extractor: Extractor,
    search: Option<Arc<dyn SearchProvider>>,
    workers: usize,
    request_timeout: Duration,
    headers: HeaderMap,
    identifying_fields: Arc<[String]>,
}

/// Result of draining a frontier
#[derive(Default)]
struct Traversal {
    pages: Vec<PageResult>,
    leads: Vec<Lead>,
    disallowed: Vec<String>,
    cancelled: bool,
}

/// Output of one worker
struct WorkerOutcome {
    seq: u64,
    page: PageResult,
    lead: Option<Lead>,
}

/// One unit of work: fetch, extract, record children
struct WorkUnit {
    seq: u64,
    entry: FrontierEntry,
    fetcher: Arc<Fetcher>,
    extractor: Extractor,
    schema: Arc<ExtractionSchema>,
    frontier: Arc<Mutex<Frontier>>,
    timeout: Duration,
    headers: HeaderMap,
    identifying_fields: Arc<[String]>,
}

impl WorkUnit {
    async fn run(self) -> WorkerOutcome {
        let entry = &self.entry;
        let mut page = match self.fetcher.fetch(&entry.url, self.timeout, &self.headers).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Fetch failed for {}: {}", entry.url, e);
                PageResult::failed(&entry.url, entry.depth, entry.parent_url.clone(), e)
            }
        };
        page.depth = entry.depth;
        page.parent_url = entry.parent_url.clone();

        if !page.is_success() {
            tracing::debug!(
                "Recorded failed page {} (status {:?})",
                page.url,
                page.status_code
            );
            return WorkerOutcome {
                seq: self.seq,
                page,
                lead: None,
            };
        }

        let extraction = self.extractor.extract(&page, &self.schema).await;
        let links: Vec<Url> = extraction
            .links
            .iter()
            .filter_map(|link| normalize_url(link).ok())
            .collect();

        {
            let mut frontier = lock(&self.frontier);
            if let Ok(final_url) = Url::parse(&page.final_url) {
                frontier.mark_visited(&final_url);
            }
            frontier.record_children(self.seq, entry, &links);
        }

        let complete = extraction.is_complete();
        page.discovered_links = extraction.links;
        page.extracted_fields = extraction.fields;

        let lead = if complete {
            Lead::from_page(&page, &self.identifying_fields)
        } else {
            None
        };

        tracing::debug!(
            url = %page.url,
            depth = page.depth,
            links = page.discovered_links.len(),
            lead = lead.is_some(),
            "Processed page"
        );

        WorkerOutcome {
            seq: self.seq,
            page,
            lead,
        }
    }
}

impl Crawler {
    pub fn builder(config: CrawlerConfig, user_agent: UserAgentConfig) -> CrawlerBuilder {
        CrawlerBuilder::new(config, user_agent)
    }

    /// Builds a crawler with the HTTP collaborators described by `config`
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let client = build_http_client(&config.user_agent, timeout)?;

        let mut builder = Self::builder(config.crawler.clone(), config.user_agent.clone())
            .client(client.clone())
            .search_provider(Arc::new(DuckDuckGoSearch::new(
                client.clone(),
                config.search.endpoint.clone(),
            )));
        if let Some(extractor) = &config.extractor {
            builder = builder.field_extractor(Arc::new(OpenAiExtractor::from_config(
                extractor,
                client.clone(),
            )));
        }
        builder.build()
    }

    /// Runs a task to completion
    pub async fn run(&self, task: &CrawlTask) -> crate::Result<CrawlReport> {
        self.run_with_cancellation(task, &CancellationFlag::new()).await
    }

    /// Runs a task, stopping early once `cancel` is set
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl reached a terminal status
    /// * `Err(LeadError::Config)` - The task is invalid; nothing was fetched
    pub async fn run_with_cancellation(
        &self,
        task: &CrawlTask,
        cancel: &CancellationFlag,
    ) -> crate::Result<CrawlReport> {
        task.validate()?;
        if !task.mode.needs_seed_url() && self.search.is_none() {
            return Err(ConfigError::Validation(format!(
                "{} mode requires a search provider",
                task.mode
            ))
            .into());
        }

        let started_at = Utc::now();
        let mut lifecycle = CrawlLifecycle::new();
        let fetcher = Arc::new(self.fetcher_for_task());
        let schema = Arc::new(task.effective_schema());
        let frontier = Arc::new(Mutex::new(Frontier::new(
            task.max_pages,
            task.effective_max_depth(),
            task.link_filter()?,
        )));

        tracing::info!(
            mode = %task.mode,
            max_pages = ?task.max_pages,
            max_depth = ?task.effective_max_depth(),
            "Starting crawl"
        );

        let (traversal, seeded) = match &task.mode {
            CrawlMode::Discover {
                industry,
                location,
                num_leads,
            } => {
                lifecycle.transition(CrawlStatus::Running)?;
                self.discover(industry, location, *num_leads, &frontier, &fetcher, &schema, cancel)
                    .await
            }
            _ => match self.seeds(task).await {
                Some(seeds) => {
                    lifecycle.transition(CrawlStatus::Running)?;
                    {
                        let mut frontier = lock(&frontier);
                        for seed in seeds {
                            frontier.seed(seed);
                        }
                    }
                    let traversal = self.traverse(&frontier, &fetcher, &schema, cancel).await;
                    (traversal, true)
                }
                None => (Traversal::default(), false),
            },
        };

        let discarded = lock(&frontier).discard();
        let status = if !seeded || seeds_unreachable(&traversal.pages) {
            CrawlStatus::Failed
        } else if traversal.cancelled {
            CrawlStatus::Cancelled
        } else {
            CrawlStatus::Completed
        };
        lifecycle.transition(status)?;

        let site_map = matches!(task.mode, CrawlMode::Map).then(|| SiteMap::from_pages(&traversal.pages));
        let report = CrawlReport {
            mode: task.mode.clone(),
            status,
            pages: traversal.pages,
            leads: traversal.leads,
            disallowed: traversal.disallowed,
            site_map,
            discarded,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            status = %report.status,
            pages = report.fetched_count(),
            failed = report.failed_count(),
            leads = report.leads.len(),
            disallowed = report.disallowed.len(),
            discarded = report.discarded,
            "Crawl finished"
        );

        Ok(report)
    }

    fn fetcher_for_task(&self) -> Fetcher {
        let robots = Arc::new(RobotsCache::new(
            Arc::clone(&self.robots_source),
            self.agent.clone(),
        ));
        Fetcher::new(
            self.client.clone(),
            robots,
            Arc::clone(&self.limiter),
            Arc::clone(&self.clock),
            self.retry,
        )
    }

    /// Resolves depth-0 seeds; None when they cannot be resolved at all
    async fn seeds(&self, task: &CrawlTask) -> Option<Vec<Url>> {
        match &task.mode {
            CrawlMode::Search { query, num_results } => {
                self.search_seeds(query, *num_results).await
            }
            _ => {
                let raw = task.url.as_deref().unwrap_or_default();
                match normalize_url(raw) {
                    Ok(url) => Some(vec![url]),
                    Err(e) => {
                        tracing::error!("Seed URL '{}' cannot be used: {}", raw, e);
                        None
                    }
                }
            }
        }
    }

    async fn search_seeds(&self, query: &str, num_results: usize) -> Option<Vec<Url>> {
        let search = self.search.as_ref()?;
        match search.search(query, num_results).await {
            Ok(urls) => Some(
                urls.into_iter()
                    .filter_map(|url| normalize_url(url.as_str()).ok())
                    .collect(),
            ),
            Err(e) => {
                tracing::error!("Search for '{}' failed: {}", query, e);
                None
            }
        }
    }

    /// Repeats search crawls over the query templates until enough leads exist
    ///
    /// The flag is false when no search returned at all.
    #[allow(clippy::too_many_arguments)]
    async fn discover(
        &self,
        industry: &str,
        location: &str,
        num_leads: usize,
        frontier: &Arc<Mutex<Frontier>>,
        fetcher: &Arc<Fetcher>,
        schema: &Arc<ExtractionSchema>,
        cancel: &CancellationFlag,
    ) -> (Traversal, bool) {
        let queries = discover_queries(industry, location);
        let per_query = num_leads.div_ceil(queries.len()).max(1);
        let mut combined = Traversal::default();
        let mut seen = HashSet::new();
        let mut seeded = false;

        for query in queries {
            if combined.leads.len() >= num_leads || combined.cancelled {
                break;
            }
            let Some(seeds) = self.search_seeds(&query, per_query).await else {
                continue;
            };
            seeded = true;

            {
                let mut frontier = lock(frontier);
                frontier.start_round();
                for seed in seeds {
                    frontier.seed(seed);
                }
            }

            let round = self.traverse(frontier, fetcher, schema, cancel).await;
            let before = combined.leads.len();
            for lead in round.leads {
                if combined.leads.len() >= num_leads {
                    break;
                }
                if seen.insert(dedup_key(&lead)) {
                    combined.leads.push(lead);
                }
            }
            tracing::info!(
                query = %query,
                new_leads = combined.leads.len() - before,
                total = combined.leads.len(),
                "Discover round finished"
            );

            combined.pages.extend(round.pages);
            combined.disallowed.extend(round.disallowed);
            combined.cancelled = round.cancelled;
        }

        (combined, seeded)
    }

    /// Drains the frontier with a bounded worker pool
    async fn traverse(
        &self,
        frontier: &Arc<Mutex<Frontier>>,
        fetcher: &Arc<Fetcher>,
        schema: &Arc<ExtractionSchema>,
        cancel: &CancellationFlag,
    ) -> Traversal {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut workers: JoinSet<WorkerOutcome> = JoinSet::new();
        let mut outcomes: BTreeMap<u64, WorkerOutcome> = BTreeMap::new();
        let mut traversal = Traversal::default();

        loop {
            if cancel.is_cancelled() {
                tracing::info!("Crawl cancelled, discarding remaining frontier");
                traversal.cancelled = true;
                break;
            }

            let dispatch = lock(frontier).next_dispatch();
            match dispatch {
                Dispatch::Entry(seq, entry) => {
                    if !fetcher.is_allowed(&entry.url).await {
                        tracing::debug!("Skipping {} (disallowed by robots.txt)", entry.url);
                        traversal.disallowed.push(entry.url.to_string());
                        continue;
                    }
                    if !lock(frontier).claim_page() {
                        break;
                    }

                    let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                        break;
                    };
                    let unit = WorkUnit {
                        seq,
                        entry,
                        fetcher: Arc::clone(fetcher),
                        extractor: self.extractor.clone(),
                        schema: Arc::clone(schema),
                        frontier: Arc::clone(frontier),
                        timeout: self.request_timeout,
                        headers: self.headers.clone(),
                        identifying_fields: Arc::clone(&self.identifying_fields),
                    };
                    workers.spawn(async move {
                        let _permit = permit;
                        unit.run().await
                    });
                }
                Dispatch::LevelDrained => {
                    drain(&mut workers, &mut outcomes).await;
                    lock(frontier).advance_level();
                }
                Dispatch::Done(StopReason::Exhausted) if !workers.is_empty() => {
                    drain(&mut workers, &mut outcomes).await;
                    lock(frontier).advance_level();
                }
                Dispatch::Done(reason) => {
                    tracing::debug!("Frontier stopped: {:?}", reason);
                    break;
                }
            }
        }

        drain(&mut workers, &mut outcomes).await;

        for outcome in outcomes.into_values() {
            if let Some(lead) = outcome.lead {
                traversal.leads.push(lead);
            }
            traversal.pages.push(outcome.page);
        }
        traversal
    }
}

/// Waits for every in-flight worker
async fn drain(workers: &mut JoinSet<WorkerOutcome>, outcomes: &mut BTreeMap<u64, WorkerOutcome>) {
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) => {
                outcomes.insert(outcome.seq, outcome);
            }
            Err(e) => tracing::error!("Crawl worker failed: {}", e),
        }
    }
}

/// True when every depth-0 page failed at the network level
fn seeds_unreachable(pages: &[PageResult]) -> bool {
    let mut seeds = pages.iter().filter(|page| page.depth == 0).peekable();
    seeds.peek().is_some()
        && seeds.all(|page| matches!(page.error, Some(FetchError::NetworkError { .. })))
}

/// Identity used to merge leads found by different searches
fn dedup_key(lead: &Lead) -> String {
    if let Some(host) = lead.website_host() {
        return format!("host:{}", host);
    }
    if let Some(email) = &lead.contact_email {
        return format!("email:{}", email.to_lowercase());
    }
    match &lead.company_name {
        Some(name) => format!("name:{}", name.trim().to_lowercase()),
        None => format!("id:{}", lead.id),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
