//! Crawler module for lead discovery
//!
//! This module contains the core crawling logic, including:
//! - Crawl tasks and their modes (single, crawl, map, search, discover)
//! - HTTP fetching with retry logic and per-host rate limiting
//! - The breadth-first frontier and its worker pool
//! - Turning extracted pages into lead candidates

mod clock;
mod coordinator;
mod fetcher;
mod frontier;
mod lead;
mod rate_limit;
mod search;
mod site_map;
mod task;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{CancellationFlag, CrawlReport, Crawler, CrawlerBuilder};
pub use fetcher::{build_http_client, Fetcher, PageResult, RetryPolicy};
pub use frontier::{Dispatch, Frontier, FrontierEntry, LinkFilter, StopReason};
pub use lead::{lead_id, Lead, SizeBucket};
pub use rate_limit::HostRateLimiter;
pub use search::{parse_results, DuckDuckGoSearch, SearchProvider};
pub use site_map::{PageType, SiteMap, SiteMapNode};
pub use task::{discover_queries, CrawlMode, CrawlTask, DISCOVER_TEMPLATES};
