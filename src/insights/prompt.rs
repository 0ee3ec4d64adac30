//! Prompt construction and answer parsing

use super::MAX_RECOMMENDATIONS;
use crate::crawler::{AuditResult, PageData};
use crate::scoring::ScoreResult;

/// Builds the prompt for the 2-3 paragraph summary
pub fn summary_prompt(page: &PageData, audit: &AuditResult, score: &ScoreResult) -> String {
    let broken_links = if audit.is_complete() {
        audit.broken_links_count().to_string()
    } else {
        "unknown (link audit did not run)".to_string()
    };

    format!(
        "You are an expert SEO consultant. Based on the following SEO audit data, \
write a comprehensive 2-3 paragraph summary of the website's SEO performance.

URL: {url}
SEO Score: {overall}/100 (Grade: {grade})
Title: {title}
Meta Description: {meta}
H1 Headings: {h1}
H2 Headings: {h2}
Total Images: {images}
Images Without Alt: {without_alt}
Total Links: {links}
Broken Links: {broken_links}
Load Time: {load_time:.2}s
Key Issues: {issues}

Write a professional, actionable summary that highlights the overall SEO health, \
identifies the most critical issues and explains their impact on search rankings.",
        url = page.url,
        overall = score.overall,
        grade = score.grade,
        title = page.title.as_deref().unwrap_or("Missing"),
        meta = page.meta_description.as_deref().unwrap_or("Missing"),
        h1 = page.h1_tags.len(),
        h2 = page.h2_tags.len(),
        images = page.total_images(),
        without_alt = page.images_without_alt(),
        links = page.total_links(),
        load_time = page.load_time_seconds,
        issues = issue_list(score),
    )
}

/// Builds the prompt for the numbered recommendation list
pub fn recommendations_prompt(score: &ScoreResult) -> String {
    let breakdown: String = score
        .sub_scores
        .named()
        .iter()
        .map(|(name, value)| format!("- {}: {:.1}/100\n", name, value))
        .collect();

    let numbered: String = (1..=MAX_RECOMMENDATIONS)
        .map(|n| format!("{}. [Recommendation]\n", n))
        .collect();

    format!(
        "You are an expert SEO consultant. Based on the following SEO audit data, \
provide exactly {count} specific, actionable optimization recommendations.

SEO Score: {overall}/100
Score Breakdown:
{breakdown}
Key Issues: {issues}

Provide {count} recommendations in the following format:
{numbered}
Each recommendation should be one sentence, prioritized by impact. \
Focus on the lowest-scoring categories and most critical issues.",
        count = MAX_RECOMMENDATIONS,
        overall = score.overall,
        breakdown = breakdown,
        issues = issue_list(score),
        numbered = numbered,
    )
}

/// Extracts list items from a model answer
///
/// Keeps lines that start with a list marker (`1.`, `2)`, `-`, `*` or `•`),
/// strips that one marker and returns at most [`MAX_RECOMMENDATIONS`] items.
pub fn parse_recommendations(answer: &str) -> Vec<String> {
    answer
        .lines()
        .filter_map(|line| strip_list_marker(line.trim()))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

/// Returns the text after a single leading list marker
fn strip_list_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix(['-', '*', '•']) {
        return Some(rest);
    }

    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(['.', ')'])
}

fn issue_list(score: &ScoreResult) -> String {
    if score.issues.is_empty() {
        "None".to_string()
    } else {
        score.issues.join(", ")
    }
}
