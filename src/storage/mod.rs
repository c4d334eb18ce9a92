//! Storage module for persisting scored leads
//!
//! This module handles the reference persistence backend used by the CLI:
//! - SQLite database initialization and schema management
//! - Run tracking (config hash, mode, status, page counts)
//! - Lead records with their scores

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteLeadStore;
pub use traits::{LeadSink, StorageError, StorageResult};

use crate::state::CrawlStatus;
use std::path::Path;

/// Opens or creates a lead database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteLeadStore)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_store(path: &Path) -> StorageResult<SqliteLeadStore> {
    SqliteLeadStore::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub mode: String,
    pub status: CrawlStatus,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub leads_found: u64,
}

/// Outcome of a run, written when it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub status: CrawlStatus,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub leads_found: u64,
}

/// A lead as read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLead {
    pub id: String,
    pub run_id: i64,
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub website: Option<String>,
    pub company_size: String,
    pub technologies: Vec<String>,
    pub composite: u8,
    pub grade: String,
    pub priority: String,
    pub recommended_action: String,
}
