//! Storage traits and error types
//!
//! This module defines the trait interface for report storage backends and
//! associated error types.

use crate::crawler::PipelineResult;
use crate::state::ReportStatus;
use crate::storage::{ReportRecord, ReportSummary};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Report not found: {0}")]
    ReportNotFound(i64),

    #[error("Invalid report transition: {from} -> {to}")]
    InvalidTransition {
        from: ReportStatus,
        to: ReportStatus,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for report storage backends
///
/// Every status-changing operation checks the report's current status and
/// refuses transitions outside `pending -> processing -> completed|failed`.
pub trait ReportStore {
    /// Creates a pending report for `url`
    ///
    /// # Returns
    ///
    /// The ID of the newly created report
    fn create_report(&mut self, url: &str) -> StorageResult<i64>;

    /// Moves a pending report to processing
    fn mark_processing(&mut self, report_id: i64) -> StorageResult<()>;

    /// Stores a pipeline result and marks the report completed
    ///
    /// The score, extraction and audit data, degradations and any insights
    /// are written atomically.
    fn complete_report(&mut self, report_id: i64, result: &PipelineResult) -> StorageResult<()>;

    /// Marks a report failed with a human-readable message
    ///
    /// # Arguments
    ///
    /// * `report_id` - The report
    /// * `stage` - Pipeline stage the failure came from, if known
    /// * `message` - Error text shown to the user
    fn fail_report(
        &mut self,
        report_id: i64,
        stage: Option<&str>,
        message: &str,
    ) -> StorageResult<()>;

    /// Gets a report and everything stored with it
    fn get_report(&self, report_id: i64) -> StorageResult<ReportRecord>;

    /// Lists reports newest first
    fn list_reports(&self, offset: usize, limit: usize) -> StorageResult<Vec<ReportSummary>>;

    /// Counts all reports
    fn count_reports(&self) -> StorageResult<u64>;

    /// Deletes a report along with its dependent records
    fn delete_report(&mut self, report_id: i64) -> StorageResult<()>;
}
