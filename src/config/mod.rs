//! Configuration module for Leadscout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use leadscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("leadscout.toml")).unwrap();
//! println!("Min host interval: {}ms", config.crawler.min_host_interval_ms);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, ExtractorConfig, OutputConfig, SearchConfig, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
