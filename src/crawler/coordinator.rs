//! Pipeline coordinator - runs one page through every analysis stage
//!
//! A run moves through `fetching -> extracting -> auditing -> scoring` and
//! each stage consumes only the previous stage's output. Fetch and scoring
//! failures abort the run with their stage tag. Audit and insight failures
//! are absorbed as degradations on an otherwise complete result.

use crate::config::{Config, FetcherConfig};
use crate::crawler::auditor::LinkAuditor;
use crate::crawler::extractor::extract;
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::types::{AuditResult, Degradation, PipelineResult};
use crate::insights::{generate_with_timeout, ChatInsightGenerator, InsightGenerator};
use crate::scoring::score;
use crate::state::PipelineStage;
use crate::url::{extract_host, validate_url};
use crate::{PipelineError, SageError};
use reqwest::Client;
use std::time::Duration;

/// Single entry point for analyzing a page
///
/// A `Pipeline` holds no per-run state, so one instance can serve any number
/// of sequential or concurrent runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    client: Client,
    fetcher: FetcherConfig,
    auditor: LinkAuditor,
    insights_timeout: Duration,
}

impl Pipeline {
    /// Creates a pipeline with a fresh HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - The analyzer configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to run
    /// * `Err(SageError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, SageError> {
        let client = build_http_client(&config.user_agent, &config.fetcher)?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a pipeline around an existing HTTP client
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            auditor: LinkAuditor::new(client.clone(), config.audit.clone()),
            client,
            fetcher: config.fetcher.clone(),
            insights_timeout: config.insights.timeout(),
        }
    }

    /// Analyzes a page without narrative insights
    pub async fn run(&self, url: &str) -> Result<PipelineResult, PipelineError> {
        self.analyze(url, None::<&ChatInsightGenerator>).await
    }

    /// Analyzes a page and, when a generator is given, attaches insights
    ///
    /// # Arguments
    ///
    /// * `url` - The page to analyze, as submitted
    /// * `generator` - Narrative generator, or `None` to skip insights
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineResult)` - Every required stage succeeded; check
    ///   `degradations` for skipped optional work
    /// * `Err(PipelineError)` - A required stage failed; `stage()` names it
    pub async fn analyze<G: InsightGenerator>(
        &self,
        url: &str,
        generator: Option<&G>,
    ) -> Result<PipelineResult, PipelineError> {
        let mut stage = PipelineStage::NotStarted;

        let target = validate_url(url).inspect_err(|e| {
            advance(&mut stage, PipelineStage::Errored);
            tracing::warn!("Rejected {:?}: {}", url, e);
        })?;
        tracing::info!("Analyzing {}", target);

        advance(&mut stage, PipelineStage::Fetching);
        let fetched = fetch_page(&self.client, &target, &self.fetcher)
            .await
            .inspect_err(|e| {
                advance(&mut stage, PipelineStage::Errored);
                tracing::warn!("Fetch of {} failed: {}", target, e);
            })?;
        tracing::info!(
            "Fetched {} (HTTP {}, {} bytes in {:.2}s)",
            fetched.final_url,
            fetched.status_code,
            fetched.size_bytes,
            fetched.elapsed_seconds()
        );
        if !fetched.is_html() {
            tracing::warn!(
                "{} is served as {}, extraction may find nothing",
                fetched.final_url,
                fetched.content_type.as_deref().unwrap_or("unknown")
            );
        }

        advance(&mut stage, PipelineStage::Extracting);
        let page_data = extract(&fetched.body, &fetched.final_url)
            .with_fetch_metrics(fetched.elapsed_seconds(), fetched.size_bytes);

        advance(&mut stage, PipelineStage::Auditing);
        let mut degradations = Vec::new();
        let links: Vec<String> = page_data.all_links().cloned().collect();
        let origin_host = extract_host(&fetched.final_url).unwrap_or_default();
        let audit_result = match self.auditor.audit(&links, &origin_host).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Link audit skipped: {}", e);
                degradations.push(Degradation::AuditSkipped {
                    reason: e.to_string(),
                });
                AuditResult::skipped(e.to_string())
            }
        };

        advance(&mut stage, PipelineStage::Scoring);
        let score_result = score(&page_data, &audit_result)
            .inspect_err(|e| {
                advance(&mut stage, PipelineStage::Errored);
                tracing::error!("Scoring {} failed: {}", target, e);
            })?;
        tracing::info!(
            "Scored {}: {} ({})",
            page_data.url,
            score_result.overall,
            score_result.grade
        );

        let insights = match generator {
            Some(generator) => {
                match generate_with_timeout(
                    generator,
                    &page_data,
                    &audit_result,
                    &score_result,
                    self.insights_timeout,
                )
                .await
                {
                    Ok(insights) => Some(insights),
                    Err(e) => {
                        tracing::warn!("Insights unavailable: {}", e);
                        degradations.push(Degradation::InsightsUnavailable {
                            reason: e.to_string(),
                        });
                        None
                    }
                }
            }
            None => None,
        };

        advance(&mut stage, PipelineStage::Done);

        Ok(PipelineResult {
            requested_url: url.to_string(),
            page_data,
            audit_result,
            score_result,
            insights,
            degradations,
        })
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    debug_assert!(stage.can_transition_to(next), "{} -> {}", stage, next);
    tracing::debug!("Pipeline stage: {} -> {}", stage, next);
    *stage = next;
}
