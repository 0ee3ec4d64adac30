//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the SiteSage database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per submitted analysis
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    status TEXT NOT NULL,
    seo_score REAL,
    grade TEXT,
    created_at TEXT NOT NULL,
    completed_at TEXT,
    error_message TEXT,
    error_stage TEXT,
    degradations TEXT
);

CREATE INDEX IF NOT EXISTS idx_reports_url ON reports(url);
CREATE INDEX IF NOT EXISTS idx_reports_created ON reports(created_at);

-- Extraction, audit and scoring output of a completed report
CREATE TABLE IF NOT EXISTS seo_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER NOT NULL UNIQUE REFERENCES reports(id) ON DELETE CASCADE,
    title TEXT,
    total_links INTEGER NOT NULL DEFAULT 0,
    broken_links_count INTEGER NOT NULL DEFAULT 0,
    load_time REAL,
    page_size INTEGER,
    page_data TEXT NOT NULL,
    audit_result TEXT NOT NULL,
    score_result TEXT NOT NULL
);

-- Narrative insights, when they were generated
CREATE TABLE IF NOT EXISTS insights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER NOT NULL UNIQUE REFERENCES reports(id) ON DELETE CASCADE,
    summary TEXT NOT NULL,
    recommendations TEXT NOT NULL,
    model_used TEXT,
    generated_at TEXT NOT NULL
);
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
