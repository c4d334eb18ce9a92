//! Database schema definitions
//!
//! This module contains the SQL schema of the lead database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    mode TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL DEFAULT 0,
    pages_failed INTEGER NOT NULL DEFAULT 0,
    leads_found INTEGER NOT NULL DEFAULT 0
);

-- Scored leads, keyed by the opaque lead id
CREATE TABLE IF NOT EXISTS leads (
    id TEXT PRIMARY KEY,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    company_name TEXT,
    contact_email TEXT,
    contact_phone TEXT,
    website TEXT,
    industry TEXT,
    location TEXT,
    company_size TEXT NOT NULL,
    technologies TEXT NOT NULL,
    social_profiles TEXT NOT NULL,
    raw_fields TEXT NOT NULL,
    source_url TEXT NOT NULL,
    crawl_depth INTEGER NOT NULL,
    fit REAL NOT NULL,
    intent REAL NOT NULL,
    engagement REAL NOT NULL,
    data_quality REAL NOT NULL,
    composite INTEGER NOT NULL,
    grade TEXT NOT NULL,
    priority TEXT NOT NULL,
    recommended_action TEXT NOT NULL,
    scored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_leads_run ON leads(run_id);
CREATE INDEX IF NOT EXISTS idx_leads_composite ON leads(composite);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
