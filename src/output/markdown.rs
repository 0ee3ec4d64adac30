//! Markdown report generation
//!
//! This module renders a completed report as a human-readable markdown
//! document: score breakdown, page details, broken links, issues and
//! narrative insights.

use crate::output::{OutputError, OutputResult};
use crate::state::ReportStatus;
use crate::storage::ReportRecord;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Broken links listed before the table is truncated
const MAX_BROKEN_LINKS_LISTED: usize = 20;

/// Path of a report's markdown file inside `reports_dir`
pub fn report_file_path(reports_dir: &Path, report_id: i64) -> PathBuf {
    reports_dir.join(format!("report_{}.md", report_id))
}

/// Writes a completed report as markdown
///
/// # Arguments
///
/// * `report` - The report to render
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - The report is not completed or the write failed
pub fn write_report_markdown(report: &ReportRecord, output_path: &Path) -> OutputResult<()> {
    let markdown = format_report_markdown(report)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote report {} to {}", report.id, output_path.display());
    Ok(())
}

/// Formats a completed report as markdown
///
/// # Returns
///
/// * `Ok(String)` - The rendered document
/// * `Err(OutputError::NotCompleted)` - The report has no analysis to render
pub fn format_report_markdown(report: &ReportRecord) -> OutputResult<String> {
    let analysis = match (&report.status, &report.analysis) {
        (ReportStatus::Completed, Some(analysis)) => analysis,
        _ => {
            return Err(OutputError::NotCompleted {
                report_id: report.id,
                status: report.status,
            })
        }
    };
    let page = &analysis.page_data;
    let audit = &analysis.audit_result;
    let score = &analysis.score_result;

    let mut md = String::new();

    md.push_str("# SiteSage SEO Report\n\n");

    md.push_str("## Report Information\n\n");
    md.push_str(&format!("- **Report ID**: {}\n", report.id));
    md.push_str(&format!("- **URL**: {}\n", report.url));
    md.push_str(&format!("- **Created**: {}\n", report.created_at));
    if let Some(completed) = &report.completed_at {
        md.push_str(&format!("- **Completed**: {}\n", completed));
    }
    md.push_str(&format!(
        "- **Overall Score**: {:.1}/100 (Grade {})\n\n",
        score.overall, score.grade
    ));

    if !report.degradations.is_empty() {
        md.push_str("> **Note**: this report is incomplete.\n");
        for degradation in &report.degradations {
            md.push_str(&format!("> - {}\n", degradation));
        }
        md.push('\n');
    }

    // Score breakdown
    md.push_str("## Score Breakdown\n\n");
    md.push_str("| Category | Score |\n");
    md.push_str("|----------|-------|\n");
    for (name, value) in score.sub_scores.named() {
        md.push_str(&format!("| {} | {:.1} |\n", name, value));
    }
    md.push('\n');

    // Page details
    md.push_str("## Page Details\n\n");
    md.push_str(&format!(
        "- **Title**: {}\n",
        page.title.as_deref().unwrap_or("(missing)")
    ));
    md.push_str(&format!(
        "- **Meta Description**: {}\n",
        page.meta_description.as_deref().unwrap_or("(missing)")
    ));
    md.push_str(&format!("- **H1 Headings**: {}\n", page.h1_tags.len()));
    md.push_str(&format!("- **H2 Headings**: {}\n", page.h2_tags.len()));
    md.push_str(&format!(
        "- **Images**: {} ({} without alt text)\n",
        page.total_images(),
        page.images_without_alt()
    ));
    md.push_str(&format!(
        "- **Links**: {} internal, {} external\n",
        page.internal_links.len(),
        page.external_links.len()
    ));
    md.push_str(&format!("- **Load Time**: {:.2}s\n", page.load_time_seconds));
    md.push_str(&format!(
        "- **Page Size**: {:.1} KB\n\n",
        page.page_size_bytes as f64 / 1024.0
    ));

    // Broken links
    if audit.is_complete() {
        md.push_str("## Broken Links\n\n");
        if audit.broken_links.is_empty() {
            md.push_str(&format!(
                "No broken links among {} checked.\n\n",
                audit.links_checked
            ));
        } else {
            md.push_str("| URL | Type | Failure |\n");
            md.push_str("|-----|------|---------|\n");
            for link in audit.broken_links.iter().take(MAX_BROKEN_LINKS_LISTED) {
                let kind = if link.internal { "internal" } else { "external" };
                md.push_str(&format!("| {} | {} | {} |\n", link.url, kind, link.failure));
            }
            if audit.broken_links.len() > MAX_BROKEN_LINKS_LISTED {
                md.push_str(&format!(
                    "\n... and {} more\n",
                    audit.broken_links.len() - MAX_BROKEN_LINKS_LISTED
                ));
            }
            md.push('\n');
        }
    }

    // Issues
    if !score.issues.is_empty() {
        md.push_str("## Issues\n\n");
        for issue in &score.issues {
            md.push_str(&format!("- {}\n", issue));
        }
        md.push('\n');
    }

    // Insights
    if let Some(insights) = &report.insights {
        md.push_str("## Summary\n\n");
        md.push_str(insights.summary.trim());
        md.push_str("\n\n");

        if !insights.recommendations.is_empty() {
            md.push_str("## Recommendations\n\n");
            for (i, recommendation) in insights.recommendations.iter().enumerate() {
                md.push_str(&format!("{}. {}\n", i + 1, recommendation));
            }
            md.push('\n');
        }

        if let Some(model) = &insights.model_used {
            md.push_str(&format!("_Generated by {}_\n", model));
        }
    }

    Ok(md)
}
