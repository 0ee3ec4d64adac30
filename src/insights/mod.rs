//! Narrative insight generation
//!
//! Insights are a free-text summary and a short list of recommendations
//! written by a language model from the scored page. The pipeline treats a
//! generator as an opaque, fallible, time-boxed collaborator: any failure
//! degrades the result but never fails the run.

mod chat;
mod prompt;

pub use chat::ChatInsightGenerator;
pub use prompt::{parse_recommendations, recommendations_prompt, summary_prompt};

use crate::crawler::{AuditResult, PageData};
use crate::scoring::ScoreResult;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of recommendations kept from a generator's answer
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Narrative output for a scored page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: String,

    pub recommendations: Vec<String>,

    /// Model that wrote the narrative, when known
    pub model_used: Option<String>,
}

/// Errors raised while generating insights
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Insight generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected API response: {0}")]
    Parse(String),

    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),
}

/// A source of narrative insights
///
/// Implementations must be safe to share across tasks; the pipeline only
/// ever borrows them.
pub trait InsightGenerator: Send + Sync {
    fn generate(
        &self,
        page: &PageData,
        audit: &AuditResult,
        score: &ScoreResult,
    ) -> impl Future<Output = Result<Insights, InsightError>> + Send;
}

/// Runs a generator under a deadline
///
/// # Returns
///
/// * `Ok(Insights)` - The generator answered in time
/// * `Err(InsightError::Timeout)` - The deadline passed first
/// * `Err(InsightError)` - The generator itself failed
pub async fn generate_with_timeout<G: InsightGenerator>(
    generator: &G,
    page: &PageData,
    audit: &AuditResult,
    score: &ScoreResult,
    timeout: Duration,
) -> Result<Insights, InsightError> {
    match tokio::time::timeout(timeout, generator.generate(page, audit, score)).await {
        Ok(result) => result,
        Err(_) => Err(InsightError::Timeout(timeout)),
    }
}
