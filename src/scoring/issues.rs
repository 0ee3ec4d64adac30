//! Human-readable issue list

use super::rules::{LOAD_TIME_PENALTIES, META_IDEAL, PAGE_SIZE_PENALTIES, TITLE_IDEAL};
use crate::crawler::{AuditResult, AuditStatus, PageData};

/// Lists the problems a page owner should fix, in category order
pub fn identify_issues(page: &PageData, audit: &AuditResult) -> Vec<String> {
    let mut issues = Vec::new();

    match page.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        None => issues.push("Missing page title".to_string()),
        Some(title) => {
            let length = title.chars().count();
            if length < TITLE_IDEAL.0 {
                issues.push(format!(
                    "Title is too short ({} characters, recommended {}-{})",
                    length, TITLE_IDEAL.0, TITLE_IDEAL.1
                ));
            } else if length > TITLE_IDEAL.1 {
                issues.push(format!(
                    "Title is too long ({} characters, recommended {}-{})",
                    length, TITLE_IDEAL.0, TITLE_IDEAL.1
                ));
            }
        }
    }

    match page
        .meta_description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        None => issues.push("Missing meta description".to_string()),
        Some(description) => {
            let length = description.chars().count();
            if length < META_IDEAL.0 {
                issues.push(format!(
                    "Meta description is too short ({} characters, recommended {}-{})",
                    length, META_IDEAL.0, META_IDEAL.1
                ));
            } else if length > META_IDEAL.1 {
                issues.push(format!(
                    "Meta description is too long ({} characters, recommended {}-{})",
                    length, META_IDEAL.0, META_IDEAL.1
                ));
            }
        }
    }

    match page.h1_tags.len() {
        0 => issues.push("Missing H1 heading".to_string()),
        1 => {}
        n => issues.push(format!("Multiple H1 headings ({})", n)),
    }
    if page.h2_tags.is_empty() {
        issues.push("No H2 headings".to_string());
    }

    let without_alt = page.images_without_alt();
    if without_alt > 0 {
        issues.push(format!(
            "{} of {} images missing alt text",
            without_alt,
            page.total_images()
        ));
    }

    match &audit.status {
        AuditStatus::Complete if audit.broken_links_count() > 0 => issues.push(format!(
            "{} broken links found",
            audit.broken_links_count()
        )),
        AuditStatus::Complete => {}
        AuditStatus::Skipped { reason } => {
            issues.push(format!("Link audit could not run: {}", reason))
        }
    }

    if LOAD_TIME_PENALTIES
        .iter()
        .any(|(threshold, _)| page.load_time_seconds > *threshold)
    {
        issues.push(format!("Slow load time ({:.2}s)", page.load_time_seconds));
    }

    if PAGE_SIZE_PENALTIES
        .iter()
        .any(|(threshold, _)| page.page_size_bytes > *threshold)
    {
        issues.push(format!(
            "Large page size ({:.2} MB)",
            page.page_size_bytes as f64 / (1024.0 * 1024.0)
        ));
    }

    issues
}
