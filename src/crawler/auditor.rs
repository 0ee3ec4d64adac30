//! Concurrent link health auditing
//!
//! The auditor probes the first `max_links` links of a page with at most
//! `max_concurrent_probes` requests in flight. Each probe task returns its
//! own `(slot, outcome)` pair and the auditor merges them after the batch
//! resolves, so no collection is shared between tasks.

use crate::config::AuditConfig;
use crate::crawler::fetcher::{probe_link, ProbeOutcome};
use crate::crawler::types::{AuditResult, AuditStatus, BrokenLink};
use crate::url::is_same_host;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Failure of the audit batch as a whole
///
/// A single link failing its probe is never an `AuditError`; it is a broken
/// link.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Probe concurrency limit must be at least 1")]
    NoConcurrency,

    #[error("Failed to dispatch probe: {0}")]
    Dispatch(String),

    #[error("Probe task failed: {0}")]
    Task(String),
}

/// Probes links for reachability with bounded concurrency
#[derive(Debug, Clone)]
pub struct LinkAuditor {
    client: Client,
    config: AuditConfig,
}

impl LinkAuditor {
    pub fn new(client: Client, config: AuditConfig) -> Self {
        Self { client, config }
    }

    /// Audits `links` and returns the broken subset
    ///
    /// Only the first `max_links` entries are probed, in the order given.
    /// `origin_host` marks each broken link as internal or external.
    ///
    /// # Returns
    ///
    /// * `Ok(AuditResult)` - All dispatched probes resolved
    /// * `Err(AuditError)` - The batch could not be dispatched or a probe task died
    pub async fn audit(
        &self,
        links: &[String],
        origin_host: &str,
    ) -> Result<AuditResult, AuditError> {
        if self.config.max_concurrent_probes == 0 {
            return Err(AuditError::NoConcurrency);
        }

        let sample: Vec<String> = links.iter().take(self.config.max_links).cloned().collect();
        if sample.len() < links.len() {
            tracing::debug!(
                "Auditing first {} of {} links",
                sample.len(),
                links.len()
            );
        }

        let timeout = self.config.probe_timeout();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_probes));
        let mut join_set = JoinSet::new();

        for (slot, url) in sample.iter().cloned().enumerate() {
            // Held by the task until its probe resolves
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| AuditError::Dispatch(e.to_string()))?;
            let client = self.client.clone();

            join_set.spawn(async move {
                let _permit = permit;
                let outcome = probe_link(&client, &url, timeout).await;
                (slot, outcome)
            });
        }

        let mut slots: Vec<Option<ProbeOutcome>> = vec![None; sample.len()];
        while let Some(joined) = join_set.join_next().await {
            let (slot, outcome) = joined.map_err(|e| AuditError::Task(e.to_string()))?;
            slots[slot] = Some(outcome);
        }

        let broken_links: Vec<BrokenLink> = sample
            .iter()
            .zip(slots)
            .filter_map(|(url, outcome)| match outcome {
                Some(ProbeOutcome::Broken(failure)) => {
                    tracing::debug!("Broken link {}: {}", url, failure);
                    Some(BrokenLink {
                        url: url.clone(),
                        internal: is_internal(url, origin_host),
                        failure,
                    })
                }
                _ => None,
            })
            .collect();

        tracing::info!(
            "Audited {} links, {} broken",
            sample.len(),
            broken_links.len()
        );

        Ok(AuditResult {
            broken_links,
            links_checked: sample.len(),
            status: AuditStatus::Complete,
        })
    }
}

fn is_internal(link: &str, origin_host: &str) -> bool {
    Url::parse(link)
        .map(|url| is_same_host(&url, origin_host))
        .unwrap_or(false)
}
