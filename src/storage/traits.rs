//! Storage traits and error types
//!
//! `LeadSink` is the persistence side of the pipeline: it receives scored
//! leads and the outcome of each run. The core makes no assumption about the
//! backend beyond records identified by an opaque id.

use crate::pipeline::ScoredLead;
use crate::storage::{RunRecord, RunSummary, StoredLead};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Receiver of completed, scored leads
pub trait LeadSink {
    // ===== Run Management =====

    /// Opens a run record
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `mode` - Crawl mode name
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn begin_run(&mut self, config_hash: &str, mode: &str) -> StorageResult<i64>;

    /// Records the final status and counts of a run
    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Lead Management =====

    /// Inserts a lead, replacing an earlier record with the same id
    fn store_lead(&mut self, run_id: i64, lead: &ScoredLead) -> StorageResult<()>;

    /// Leads last stored by a run, best composite first
    fn leads_for_run(&self, run_id: i64) -> StorageResult<Vec<StoredLead>>;

    /// Total number of stored leads
    fn count_leads(&self) -> StorageResult<u64>;
}
