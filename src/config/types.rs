use crate::extract::ExtractionSchema;
use crate::scoring::IcpConfig;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Leadscout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub extractor: Option<ExtractorConfig>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub icp: IcpConfig,
    /// Field name -> declared kind ("string", "number", "boolean", "list")
    #[serde(default)]
    pub schema: BTreeMap<String, String>,
}

impl Config {
    /// Returns the extraction schema, falling back to the built-in lead schema
    pub fn extraction_schema(&self) -> ExtractionSchema {
        if self.schema.is_empty() {
            ExtractionSchema::lead_defaults()
        } else {
            ExtractionSchema::from_declared(&self.schema)
        }
    }

    /// Formats the user agent string sent with every request
    pub fn user_agent_string(&self) -> String {
        self.user_agent.header_value()
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Size of the worker pool draining the frontier
    #[serde(rename = "max-concurrent-workers", default = "default_workers")]
    pub max_concurrent_workers: u32,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "min-host-interval-ms", default = "default_interval_ms")]
    pub min_host_interval_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient failures (timeouts, 429, 5xx)
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the exponential retry backoff (milliseconds)
    #[serde(rename = "retry-base-ms", default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Extracted fields of which at least one must be present to emit a lead
    #[serde(rename = "identifying-fields", default = "default_identifying_fields")]
    pub identifying_fields: Vec<String>,

    /// Page budget used when the caller gives none
    #[serde(rename = "default-max-pages", default = "default_max_pages")]
    pub default_max_pages: usize,

    /// Depth budget used when the caller gives none
    #[serde(rename = "default-max-depth", default = "default_max_depth")]
    pub default_max_depth: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_workers: default_workers(),
            min_host_interval_ms: default_interval_ms(),
            request_timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            identifying_fields: default_identifying_fields(),
            default_max_pages: default_max_pages(),
            default_max_depth: default_max_depth(),
        }
    }
}

fn default_workers() -> u32 {
    5
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_ms() -> u64 {
    500
}

fn default_identifying_fields() -> Vec<String> {
    vec!["company_name".to_string(), "contact_email".to_string()]
}

fn default_max_pages() -> usize {
    50
}

fn default_max_depth() -> u32 {
    2
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database receiving scored leads
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "./leads.db".to_string()
}

/// AI extraction collaborator configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(rename = "max-tokens", default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Page text is truncated to this many characters before sending
    #[serde(rename = "max-input-chars", default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_input_chars() -> usize {
    8000
}

/// Search collaborator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// HTML search endpoint; the query is sent as the `q` parameter
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".to_string()
}
