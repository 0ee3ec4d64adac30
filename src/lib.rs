//! SiteSage: an on-page SEO analyzer
//!
//! This crate fetches a web page, extracts its SEO-relevant structure, probes
//! its links for reachability and turns the findings into a deterministic
//! score with six category sub-scores.
//!
//! The single entry point for a run is [`crawler::Pipeline`]. Everything
//! around it (report persistence, the job worker, narrative generation and
//! report export) consumes the pipeline's plain data output.

pub mod config;
pub mod crawler;
pub mod insights;
pub mod output;
pub mod scoring;
pub mod state;
pub mod storage;
pub mod url;
pub mod worker;

use thiserror::Error;

pub use crawler::{AuditError, FetchError};
pub use insights::InsightError;
pub use scoring::ScoreError;

/// Main error type for SiteSage operations
#[derive(Debug, Error)]
pub enum SageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Job worker is not running")]
    WorkerStopped,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
///
/// These are raised before any network activity and are distinct from
/// [`FetchError`].
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Fatal pipeline errors, tagged with the stage that produced them
///
/// Audit and insight failures never appear here: they degrade the result
/// instead of aborting the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Scoring failed: {0}")]
    Score(#[from] ScoreError),
}

impl PipelineError {
    /// The stage in which the run failed
    pub fn stage(&self) -> state::PipelineStage {
        match self {
            Self::InvalidUrl(_) => state::PipelineStage::NotStarted,
            Self::Fetch(_) => state::PipelineStage::Fetching,
            Self::Score(_) => state::PipelineStage::Scoring,
        }
    }
}

/// Result type alias for SiteSage operations
pub type Result<T> = std::result::Result<T, SageError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{AuditResult, PageData, Pipeline, PipelineResult};
pub use scoring::{score, ScoreResult};
pub use state::{PipelineStage, ReportStatus};
pub use url::{normalize_link, validate_url};
