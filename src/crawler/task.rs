//! Crawl task definitions

use crate::crawler::frontier::LinkFilter;
use crate::extract::ExtractionSchema;
use crate::ConfigError;
use regex::Regex;
use std::fmt;

/// Search query templates used by discover mode
pub const DISCOVER_TEMPLATES: &[&str] = &[
    "{industry} companies in {location}",
    "top {industry} businesses {location}",
    "{industry} startups {location}",
    "best {industry} services {location}",
];

/// How a crawl is seeded and what it collects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlMode {
    /// One page, no link following
    Single,
    /// Follow links from one seed
    Crawl,
    /// Like crawl, but only the link structure is collected
    Map,
    /// Seeds come from a search query
    Search { query: String, num_results: usize },
    /// Repeated searches built from industry and location
    Discover {
        industry: String,
        location: String,
        num_leads: usize,
    },
}

impl CrawlMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Crawl => "crawl",
            Self::Map => "map",
            Self::Search { .. } => "search",
            Self::Discover { .. } => "discover",
        }
    }

    /// True for modes seeded from a caller-supplied URL
    pub fn needs_seed_url(&self) -> bool {
        matches!(self, Self::Single | Self::Crawl | Self::Map)
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A crawl request, immutable once the crawl starts
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub url: Option<String>,
    pub mode: CrawlMode,
    pub max_pages: Option<usize>,
    pub max_depth: Option<u32>,
    pub same_domain_only: bool,
    pub extraction_schema: ExtractionSchema,
    /// Regexes a followed link must match (any); empty means all
    pub include_patterns: Vec<String>,
    /// Regexes excluding a link from being followed
    pub exclude_patterns: Vec<String>,
}

impl CrawlTask {
    fn with_mode(url: Option<String>, mode: CrawlMode) -> Self {
        Self {
            url,
            mode,
            max_pages: None,
            max_depth: None,
            same_domain_only: true,
            extraction_schema: ExtractionSchema::lead_defaults(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    /// Fetches exactly one page
    pub fn single(url: impl Into<String>) -> Self {
        Self::with_mode(Some(url.into()), CrawlMode::Single).with_max_depth(0)
    }

    /// Follows links from `url`
    pub fn crawl(url: impl Into<String>) -> Self {
        Self::with_mode(Some(url.into()), CrawlMode::Crawl)
    }

    /// Collects the link structure reachable from `url`
    pub fn map(url: impl Into<String>) -> Self {
        Self::with_mode(Some(url.into()), CrawlMode::Map)
    }

    /// Crawls the results of a search query
    pub fn search(query: impl Into<String>, num_results: usize) -> Self {
        Self::with_mode(
            None,
            CrawlMode::Search {
                query: query.into(),
                num_results,
            },
        )
    }

    /// Searches by industry and location until `num_leads` leads are found
    pub fn discover(
        industry: impl Into<String>,
        location: impl Into<String>,
        num_leads: usize,
    ) -> Self {
        Self::with_mode(
            None,
            CrawlMode::Discover {
                industry: industry.into(),
                location: location.into(),
                num_leads,
            },
        )
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_same_domain_only(mut self, same_domain_only: bool) -> Self {
        self.same_domain_only = same_domain_only;
        self
    }

    pub fn with_schema(mut self, schema: ExtractionSchema) -> Self {
        self.extraction_schema = schema;
        self
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Depth limit after mode rules are applied
    ///
    /// Single pages never follow links; search-seeded modes default to the
    /// result pages themselves.
    pub fn effective_max_depth(&self) -> Option<u32> {
        match self.mode {
            CrawlMode::Single => Some(0),
            CrawlMode::Search { .. } | CrawlMode::Discover { .. } => {
                self.max_depth.or(Some(0))
            }
            _ => self.max_depth,
        }
    }

    /// Schema used for extraction; map mode ignores the configured one
    pub fn effective_schema(&self) -> ExtractionSchema {
        match self.mode {
            CrawlMode::Map => ExtractionSchema::empty(),
            _ => self.extraction_schema.clone(),
        }
    }

    /// Checks the task before a crawl starts
    ///
    /// # Returns
    ///
    /// * `Err(ConfigError::UnboundedCrawl)` - no page or depth bound, or a zero page budget
    /// * `Err(ConfigError::MissingSeed)` - a URL-seeded mode without a URL
    /// * `Err(ConfigError::Validation)` - bad search parameters or link pattern
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == Some(0)
            || (self.max_pages.is_none() && self.effective_max_depth().is_none())
        {
            return Err(ConfigError::UnboundedCrawl);
        }

        if self.mode.needs_seed_url()
            && self.url.as_deref().map_or(true, |url| url.trim().is_empty())
        {
            return Err(ConfigError::MissingSeed(self.mode.name().to_string()));
        }

        match &self.mode {
            CrawlMode::Search { query, .. } if query.trim().is_empty() => {
                return Err(ConfigError::Validation("search query cannot be empty".to_string()));
            }
            CrawlMode::Search { num_results: 0, .. } => {
                return Err(ConfigError::Validation(
                    "search needs at least one result".to_string(),
                ));
            }
            CrawlMode::Discover { num_leads: 0, .. } => {
                return Err(ConfigError::Validation(
                    "discover needs a positive lead count".to_string(),
                ));
            }
            CrawlMode::Discover {
                industry,
                location,
                ..
            } if industry.trim().is_empty() || location.trim().is_empty() => {
                return Err(ConfigError::Validation(
                    "discover mode needs an industry and a location".to_string(),
                ));
            }
            _ => {}
        }

        self.link_filter().map(|_| ())
    }

    /// Compiles the link-following policy
    pub fn link_filter(&self) -> Result<LinkFilter, ConfigError> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>, ConfigError> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        ConfigError::Validation(format!("invalid link pattern '{}': {}", p, e))
                    })
                })
                .collect()
        };

        Ok(LinkFilter {
            same_domain_only: self.same_domain_only,
            include: compile(&self.include_patterns)?,
            exclude: compile(&self.exclude_patterns)?,
        })
    }
}

/// Expands the discover templates for an industry and location
pub fn discover_queries(industry: &str, location: &str) -> Vec<String> {
    DISCOVER_TEMPLATES
        .iter()
        .map(|template| {
            template
                .replace("{industry}", industry.trim())
                .replace("{location}", location.trim())
        })
        .collect()
}
