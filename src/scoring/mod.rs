//! SEO scoring
//!
//! Maps a page's extracted data and link audit into six category sub-scores
//! and a weighted overall score. Scoring is pure: no I/O, and the only
//! failure is a contract violation between stages.
//!
//! | Category | Weight |
//! |----------|--------|
//! | Title | 15% |
//! | Meta description | 15% |
//! | Headings | 20% |
//! | Images | 20% |
//! | Links | 15% |
//! | Performance | 15% |

mod issues;
mod rules;

pub use issues::identify_issues;
pub use rules::{
    headings_score, images_score, links_score, meta_description_score, performance_score,
    title_score,
};

use crate::crawler::{AuditResult, PageData};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category weights in percent: title, meta description, headings, images,
/// links, performance
pub const WEIGHT_PERCENT: [u32; 6] = [15, 15, 20, 20, 15, 15];

const _: () = {
    let mut sum = 0;
    let mut i = 0;
    while i < WEIGHT_PERCENT.len() {
        sum += WEIGHT_PERCENT[i];
        i += 1;
    }
    assert!(sum == 100, "category weights must sum to 100%");
};

/// Errors raised when stage outputs violate their contracts
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Invalid scoring input: {0}")]
    InvalidInput(String),
}

/// The six category sub-scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub title: f64,
    pub meta_description: f64,
    pub headings: f64,
    pub images: f64,
    pub links: f64,
    pub performance: f64,
}

impl SubScores {
    /// Sub-scores in weight order, paired with their display names
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("Title", self.title),
            ("Meta description", self.meta_description),
            ("Headings", self.headings),
            ("Images", self.images),
            ("Links", self.links),
            ("Performance", self.performance),
        ]
    }

    fn values(&self) -> [f64; 6] {
        [
            self.title,
            self.meta_description,
            self.headings,
            self.images,
            self.links,
            self.performance,
        ]
    }

    /// Weighted sum at full precision
    pub fn weighted_total(&self) -> f64 {
        self.values()
            .iter()
            .zip(WEIGHT_PERCENT.iter())
            .map(|(score, weight)| score * f64::from(*weight) / 100.0)
            .sum()
    }
}

/// Letter grade for an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::A
        } else if score >= 80.0 {
            Self::B
        } else if score >= 70.0 {
            Self::C
        } else if score >= 60.0 {
            Self::D
        } else {
            Self::F
        }
    }

    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "F" => Some(Self::F),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(letter)
    }
}

/// Final evaluation of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Weighted composite rounded to one decimal place
    pub overall: f64,

    pub sub_scores: SubScores,

    pub grade: Grade,

    /// Human-readable problems found on the page
    pub issues: Vec<String>,
}

/// Scores a page from its extracted data and link audit
///
/// Sub-scores are clamped to [0, 100] and kept at full precision; only the
/// overall score is rounded.
///
/// # Errors
///
/// `ScoreError::InvalidInput` if the load time is negative or not finite, or
/// if the audit reports a broken link the page does not contain.
///
/// # Example
///
/// ```
/// use site_sage::crawler::{extract, AuditResult, AuditStatus};
/// use site_sage::scoring::score;
/// use url::Url;
///
/// let page = extract("<title>Example Domain</title>", &Url::parse("https://example.com/").unwrap());
/// let audit = AuditResult { broken_links: vec![], links_checked: 0, status: AuditStatus::Complete };
/// let result = score(&page, &audit).unwrap();
/// assert_eq!(result.sub_scores.images, 100.0);
/// ```
pub fn score(page: &PageData, audit: &AuditResult) -> Result<ScoreResult, ScoreError> {
    validate_input(page, audit)?;

    let sub_scores = SubScores {
        title: clamp(title_score(page.title.as_deref())),
        meta_description: clamp(meta_description_score(page.meta_description.as_deref())),
        headings: clamp(headings_score(page.h1_tags.len(), page.h2_tags.len())),
        images: clamp(images_score(page.total_images(), page.images_without_alt())),
        links: clamp(links_score(page.total_links(), audit.broken_links_count())),
        performance: clamp(performance_score(
            page.load_time_seconds,
            page.page_size_bytes,
        )),
    };

    let overall = round_one_decimal(sub_scores.weighted_total());

    Ok(ScoreResult {
        overall,
        sub_scores,
        grade: Grade::from_score(overall),
        issues: identify_issues(page, audit),
    })
}

fn validate_input(page: &PageData, audit: &AuditResult) -> Result<(), ScoreError> {
    if !page.load_time_seconds.is_finite() || page.load_time_seconds < 0.0 {
        return Err(ScoreError::InvalidInput(format!(
            "load time must be a non-negative number, got {}",
            page.load_time_seconds
        )));
    }

    if let Some(stray) = audit
        .broken_links
        .iter()
        .find(|link| !page.contains_link(&link.url))
    {
        return Err(ScoreError::InvalidInput(format!(
            "broken link {} is not among the page's links",
            stray.url
        )));
    }

    Ok(())
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
