//! Storage module for persisting analysis reports
//!
//! This module handles all database operations for reports, including:
//! - SQLite database initialization and schema management
//! - Report lifecycle tracking
//! - Persisting pipeline output and narrative insights

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteReportStore;
pub use traits::{ReportStore, StorageError, StorageResult};

use crate::crawler::{AuditResult, Degradation, PageData};
use crate::insights::Insights;
use crate::scoring::{Grade, ScoreResult};
use crate::state::ReportStatus;
use std::path::Path;

/// Initializes or opens a report database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteReportStore)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_store(path: &Path) -> StorageResult<SqliteReportStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteReportStore::new(path)
}

/// Represents a report in the database
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub id: i64,
    pub url: String,
    pub status: ReportStatus,
    pub seo_score: Option<f64>,
    pub grade: Option<Grade>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub error_stage: Option<String>,
    pub degradations: Vec<Degradation>,

    /// Present once the report is completed
    pub analysis: Option<StoredAnalysis>,

    /// Present only when insights were generated
    pub insights: Option<Insights>,
}

/// Pipeline output stored with a completed report
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnalysis {
    pub page_data: PageData,
    pub audit_result: AuditResult,
    pub score_result: ScoreResult,
}

/// One row of a report listing
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub id: i64,
    pub url: String,
    pub status: ReportStatus,
    pub seo_score: Option<f64>,
    pub created_at: String,
}
