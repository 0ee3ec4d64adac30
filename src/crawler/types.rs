//! Records passed between pipeline stages
//!
//! Each stage produces a new record and never mutates its predecessor's.

use crate::insights::Insights;
use crate::scoring::ScoreResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An `<img>` element found on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Absolute image URL
    pub src: String,

    /// Alt text; empty when the attribute is missing or blank
    pub alt: String,
}

impl ImageInfo {
    pub fn has_alt(&self) -> bool {
        !self.alt.trim().is_empty()
    }
}

/// SEO-relevant structure extracted from one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    /// The URL the markup was served from (after redirects)
    pub url: String,

    pub title: Option<String>,

    pub meta_description: Option<String>,

    /// Level-1 heading texts in document order
    pub h1_tags: Vec<String>,

    /// Level-2 heading texts in document order
    pub h2_tags: Vec<String>,

    pub images: Vec<ImageInfo>,

    /// Normalized links on the page's own host, first-seen order, no duplicates
    pub internal_links: Vec<String>,

    /// Normalized links on any other host, first-seen order, no duplicates
    pub external_links: Vec<String>,

    /// Wall-clock time of the primary fetch
    pub load_time_seconds: f64,

    /// Byte length of the response body
    pub page_size_bytes: usize,
}

impl PageData {
    /// Returns a copy carrying the primary fetch's timing and size
    pub fn with_fetch_metrics(self, load_time_seconds: f64, page_size_bytes: usize) -> Self {
        Self {
            load_time_seconds,
            page_size_bytes,
            ..self
        }
    }

    pub fn total_images(&self) -> usize {
        self.images.len()
    }

    pub fn images_without_alt(&self) -> usize {
        self.images.iter().filter(|image| !image.has_alt()).count()
    }

    pub fn total_links(&self) -> usize {
        self.internal_links.len() + self.external_links.len()
    }

    /// All links, internal first, each in first-seen order
    pub fn all_links(&self) -> impl Iterator<Item = &String> {
        self.internal_links.iter().chain(self.external_links.iter())
    }

    pub fn contains_link(&self, url: &str) -> bool {
        self.all_links().any(|link| link == url)
    }
}

/// Why a probed link was judged broken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum ProbeFailure {
    /// The target answered with a status >= 400
    HttpStatus(u16),
    Timeout,
    Dns,
    Connection,
    Other(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(status) => write!(f, "HTTP {}", status),
            Self::Timeout => f.write_str("timeout"),
            Self::Dns => f.write_str("DNS resolution failed"),
            Self::Connection => f.write_str("connection failed"),
            Self::Other(message) => f.write_str(message),
        }
    }
}

/// A link that failed its health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub url: String,
    pub internal: bool,
    pub failure: ProbeFailure,
}

/// Whether the link audit ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum AuditStatus {
    Complete,
    /// Broken-link data is unavailable; an empty broken set means nothing
    Skipped { reason: String },
}

/// Reachability of the page's links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Broken links in first-seen order
    pub broken_links: Vec<BrokenLink>,

    /// How many links were actually probed
    pub links_checked: usize,

    pub status: AuditStatus,
}

impl AuditResult {
    /// An audit that could not run; never to be read as "all links healthy"
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            broken_links: Vec::new(),
            links_checked: 0,
            status: AuditStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn broken_links_count(&self) -> usize {
        self.broken_links.len()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, AuditStatus::Complete)
    }
}

/// A non-fatal failure absorbed by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Degradation {
    /// The link audit failed; scoring used an empty broken set
    AuditSkipped { reason: String },

    /// Narrative insights were requested but could not be produced
    InsightsUnavailable { reason: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuditSkipped { reason } => write!(f, "link audit skipped: {}", reason),
            Self::InsightsUnavailable { reason } => {
                write!(f, "narrative insights unavailable: {}", reason)
            }
        }
    }
}

/// Everything a successful run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// The URL as submitted
    pub requested_url: String,

    pub page_data: PageData,

    pub audit_result: AuditResult,

    pub score_result: ScoreResult,

    /// Present only when insights were requested and generated
    pub insights: Option<Insights>,

    pub degradations: Vec<Degradation>,
}

impl PipelineResult {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageData {
        PageData {
            url: "https://example.com/".to_string(),
            title: None,
            meta_description: None,
            h1_tags: vec![],
            h2_tags: vec![],
            images: vec![
                ImageInfo {
                    src: "https://example.com/a.png".to_string(),
                    alt: "A".to_string(),
                },
                ImageInfo {
                    src: "https://example.com/b.png".to_string(),
                    alt: String::new(),
                },
            ],
            internal_links: vec!["https://example.com/a".to_string()],
            external_links: vec!["https://other.com/".to_string()],
            load_time_seconds: 0.0,
            page_size_bytes: 0,
        }
    }

    #[test]
    fn test_counts() {
        let page = page();
        assert_eq!(page.total_images(), 2);
        assert_eq!(page.images_without_alt(), 1);
        assert_eq!(page.total_links(), 2);
        assert!(page.contains_link("https://other.com/"));
        assert!(!page.contains_link("https://missing.com/"));
    }

    #[test]
    fn test_all_links_internal_first() {
        let page = page();
        let links: Vec<&String> = page.all_links().collect();
        assert_eq!(links, vec!["https://example.com/a", "https://other.com/"]);
    }

    #[test]
    fn test_with_fetch_metrics() {
        let page = page().with_fetch_metrics(0.45, 1256);
        assert_eq!(page.load_time_seconds, 0.45);
        assert_eq!(page.page_size_bytes, 1256);
        assert_eq!(page.total_links(), 2);
    }

    #[test]
    fn test_skipped_audit_is_flagged() {
        let audit = AuditResult::skipped("limiter closed");
        assert!(!audit.is_complete());
        assert_eq!(audit.broken_links_count(), 0);
    }

    #[test]
    fn test_probe_failure_serialization_shape() {
        let json = serde_json::to_string(&ProbeFailure::HttpStatus(404)).unwrap();
        assert_eq!(json, r#"{"kind":"http-status","detail":404}"#);
    }
}
