//! Crawler module for page analysis
//!
//! This module contains the analysis pipeline, including:
//! - HTTP fetching with timing, size limits and error classification
//! - HTML extraction of SEO-relevant structure
//! - Concurrent link auditing
//! - Overall run coordination

mod auditor;
mod coordinator;
mod extractor;
mod fetcher;
mod types;

pub use auditor::{AuditError, LinkAuditor};
pub use coordinator::Pipeline;
pub use extractor::extract;
pub use fetcher::{build_http_client, fetch_page, probe_link, FetchError, FetchedPage, ProbeOutcome};
pub use types::{
    AuditResult, AuditStatus, BrokenLink, Degradation, ImageInfo, PageData, PipelineResult,
    ProbeFailure,
};
