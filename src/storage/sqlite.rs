//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the LeadSink trait.

use crate::pipeline::ScoredLead;
use crate::state::CrawlStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LeadSink, StorageError, StorageResult};
use crate::storage::{RunRecord, RunSummary, StoredLead};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, mode, status, \
     pages_fetched, pages_failed, leads_found";

/// SQLite storage backend
pub struct SqliteLeadStore {
    conn: Connection,
}

impl SqliteLeadStore {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteLeadStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        mode: row.get(4)?,
        status: CrawlStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(CrawlStatus::Failed),
        pages_fetched: row.get(6)?,
        pages_failed: row.get(7)?,
        leads_found: row.get(8)?,
    })
}

impl LeadSink for SqliteLeadStore {
    // ===== Run Management =====

    fn begin_run(&mut self, config_hash: &str, mode: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, mode, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, mode, CrawlStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_fetched = ?3,
             pages_failed = ?4, leads_found = ?5 WHERE id = ?6",
            params![
                summary.status.to_db_string(),
                now,
                summary.pages_fetched,
                summary.pages_failed,
                summary.leads_found,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    // ===== Lead Management =====

    fn store_lead(&mut self, run_id: i64, scored: &ScoredLead) -> StorageResult<()> {
        let lead = &scored.lead;
        let score = &scored.score;
        let technologies = serde_json::to_string(&lead.technologies)?;
        let social_profiles = serde_json::to_string(&lead.social_profiles)?;
        let raw_fields = serde_json::to_string(&lead.raw_extracted_fields)?;

        self.conn.execute(
            "INSERT INTO leads (id, run_id, company_name, contact_email, contact_phone, website,
             industry, location, company_size, technologies, social_profiles, raw_fields,
             source_url, crawl_depth, fit, intent, engagement, data_quality, composite, grade,
             priority, recommended_action, scored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21, ?22, ?23)
             ON CONFLICT(id) DO UPDATE SET
                run_id = excluded.run_id,
                company_name = excluded.company_name,
                contact_email = excluded.contact_email,
                contact_phone = excluded.contact_phone,
                website = excluded.website,
                industry = excluded.industry,
                location = excluded.location,
                company_size = excluded.company_size,
                technologies = excluded.technologies,
                social_profiles = excluded.social_profiles,
                raw_fields = excluded.raw_fields,
                source_url = excluded.source_url,
                crawl_depth = excluded.crawl_depth,
                fit = excluded.fit,
                intent = excluded.intent,
                engagement = excluded.engagement,
                data_quality = excluded.data_quality,
                composite = excluded.composite,
                grade = excluded.grade,
                priority = excluded.priority,
                recommended_action = excluded.recommended_action,
                scored_at = excluded.scored_at",
            params![
                lead.id,
                run_id,
                lead.company_name,
                lead.contact_email,
                lead.contact_phone,
                lead.website,
                lead.industry,
                lead.location,
                lead.company_size_bucket.as_str(),
                technologies,
                social_profiles,
                raw_fields,
                lead.source_url,
                lead.crawl_depth,
                score.fit,
                score.intent,
                score.engagement,
                score.data_quality,
                score.composite,
                score.grade.as_str(),
                scored.priority.as_str(),
                scored.recommended_action,
                scored.scored_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn leads_for_run(&self, run_id: i64) -> StorageResult<Vec<StoredLead>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, company_name, contact_email, website, company_size, technologies,
             composite, grade, priority, recommended_action
             FROM leads WHERE run_id = ?1 ORDER BY composite DESC, id",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((
                StoredLead {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    company_name: row.get(2)?,
                    contact_email: row.get(3)?,
                    website: row.get(4)?,
                    company_size: row.get(5)?,
                    technologies: Vec::new(),
                    composite: row.get(7)?,
                    grade: row.get(8)?,
                    priority: row.get(9)?,
                    recommended_action: row.get(10)?,
                },
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut leads = Vec::new();
        for row in rows {
            let (mut lead, technologies) = row?;
            lead.technologies = serde_json::from_str(&technologies)?;
            leads.push(lead);
        }
        Ok(leads)
    }

    fn count_leads(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
