//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlStatus`: lifecycle of a crawl task (pending, running, completed, ...)
//! - `CrawlLifecycle`: guarded status holder rejecting invalid transitions
//! - `HostState`: per-host politeness bookkeeping for the rate-limit ledger

mod crawl_status;
mod host_state;

pub use crawl_status::{CrawlLifecycle, CrawlStatus};
pub use host_state::HostState;
