//! Output module for exporting reports
//!
//! Completed reports are rendered as markdown documents, one file per
//! report.

mod markdown;

pub use markdown::{format_report_markdown, report_file_path, write_report_markdown};

use crate::state::ReportStatus;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Report {report_id} is {status}, only completed reports can be exported")]
    NotCompleted {
        report_id: i64,
        status: ReportStatus,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
