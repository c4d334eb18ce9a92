//! Leadscout: a polite lead crawler and scorer
//!
//! This crate discovers company pages on the web, extracts lead attributes from
//! them, enriches the resulting records and scores them against an ideal
//! customer profile. Crawling respects robots.txt and per-host rate limits.

pub mod config;
pub mod crawler;
pub mod enrich;
pub mod extract;
pub mod pipeline;
pub mod robots;
pub mod scoring;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Leadscout operations
#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlStatus,
        to: state::CrawlStatus,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are fatal at crawl start: a crawl never begins with an invalid
/// configuration and never silently falls back to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Scoring weights must sum to 1.0, got {sum}")]
    InvalidWeights { sum: f64 },

    #[error("Crawl has no max_pages or max_depth bound")]
    UnboundedCrawl,

    #[error("Crawl mode {0} requires a seed URL")]
    MissingSeed(String),
}

/// Per-page fetch failures
///
/// Recorded on the failed page rather than aborting the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("URL disallowed by robots.txt: {url}")]
    Disallowed { url: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpError { url: String, status: u16 },

    #[error("Network error for {url}: {message}")]
    NetworkError { url: String, message: String },
}

impl FetchError {
    /// Returns true if a retry might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::HttpError { status, .. } => *status == 429 || *status >= 500,
            Self::Disallowed { .. } | Self::NetworkError { .. } => false,
        }
    }
}

/// Failures of the AI extraction collaborator
///
/// Either variant degrades the page to links-only; no lead is emitted from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Extraction collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Extraction collaborator returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Failures of the search collaborator
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Search endpoint returned HTTP {0}")]
    Status(u16),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Leadscout operations
pub type Result<T> = std::result::Result<T, LeadError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlMode, CrawlReport, CrawlTask, Crawler, Lead, PageResult};
pub use enrich::enrich;
pub use pipeline::{LeadPipeline, ScoredLead};
pub use scoring::{score, Grade, IcpConfig, LeadScore, ScoringEngine};
pub use state::CrawlStatus;
pub use url::{extract_domain, normalize_url, visit_key};
