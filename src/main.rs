//! SiteSage main entry point
//!
//! This is the command-line interface for the SiteSage SEO analyzer.

use clap::{Parser, Subcommand};
use site_sage::config::{load_config_or_default, Config};
use site_sage::crawler::Pipeline;
use site_sage::insights::ChatInsightGenerator;
use site_sage::output::{report_file_path, write_report_markdown};
use site_sage::storage::{open_store, ReportStore, SqliteReportStore};
use site_sage::worker::{JobOutcome, ReportWorker, DEFAULT_QUEUE_SIZE};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// SiteSage: an on-page SEO analyzer
///
/// SiteSage fetches a page, checks its metadata, headings, images, links and
/// performance, scores it out of 100 and stores the report for later export.
#[derive(Parser, Debug)]
#[command(name = "site-sage")]
#[command(version)]
#[command(about = "An on-page SEO analyzer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a URL and store the report
    Analyze {
        /// The page to analyze
        url: String,

        /// Skip narrative insight generation
        #[arg(long)]
        no_insights: bool,
    },

    /// List stored reports, newest first
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one report
    Show {
        /// Report ID
        id: i64,
    },

    /// Export a completed report as markdown
    Export {
        /// Report ID
        id: i64,

        /// Output file (defaults to <reports-dir>/report_<ID>.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a report and everything stored with it
    Delete {
        /// Report ID
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match load_config_or_default(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    match cli.command {
        Command::Analyze { url, no_insights } => handle_analyze(config, &url, !no_insights).await,
        Command::List { offset, limit } => handle_list(&config, offset, limit),
        Command::Show { id } => handle_show(&config, id),
        Command::Export { id, output } => handle_export(&config, id, output),
        Command::Delete { id } => handle_delete(&config, id),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_sage=info,warn"),
            1 => EnvFilter::new("site_sage=debug,info"),
            2 => EnvFilter::new("site_sage=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_config_store(config: &Config) -> Result<SqliteReportStore, Box<dyn std::error::Error>> {
    Ok(open_store(Path::new(&config.output.database_path))?)
}

/// Handles `analyze`: runs the pipeline through the worker and prints the result
async fn handle_analyze(
    config: Config,
    url: &str,
    with_insights: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(Mutex::new(open_config_store(&config)?));
    let pipeline = Pipeline::new(&config)?;

    let generator = if with_insights && config.insights.enabled {
        match ChatInsightGenerator::from_config(&config.insights) {
            Ok(generator) => {
                tracing::info!("Narrative insights from model {}", generator.model());
                Some(generator)
            }
            Err(e) => {
                tracing::warn!("Narrative insights disabled: {}", e);
                None
            }
        }
    } else {
        None
    };
    let with_insights = generator.is_some();

    let worker = ReportWorker::spawn(pipeline, store.clone(), generator, DEFAULT_QUEUE_SIZE);
    let ticket = worker.submit(url, with_insights).await?;
    tracing::info!("Created report {}", ticket.report_id);

    let outcome = ticket.outcome.await.map_err(|_| site_sage::SageError::WorkerStopped)??;
    worker.shutdown().await?;

    match outcome {
        JobOutcome::Completed {
            report_id,
            overall_score,
            degradations,
        } => {
            println!("Report {}: {:.1}/100", report_id, overall_score);
            for degradation in &degradations {
                println!("  ! {}", degradation);
            }

            let path = report_file_path(Path::new(&config.output.reports_dir), report_id);
            let report = store
                .lock()
                .map_err(|_| site_sage::storage::StorageError::LockPoisoned)?
                .get_report(report_id)?;
            write_report_markdown(&report, &path)?;
            println!("✓ Report exported to: {}", path.display());
            Ok(())
        }
        JobOutcome::Failed {
            report_id,
            stage,
            message,
        } => {
            tracing::error!("Report {} failed during {}: {}", report_id, stage, message);
            Err(message.into())
        }
    }
}

/// Handles `list`
fn handle_list(
    config: &Config,
    offset: usize,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_config_store(config)?;
    let total = store.count_reports()?;
    let reports = store.list_reports(offset, limit)?;

    println!("{:>6}  {:<10}  {:>6}  {:<25}  URL", "ID", "STATUS", "SCORE", "CREATED");
    for report in &reports {
        let score = report
            .seo_score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<10}  {:>6}  {:<25}  {}",
            report.id,
            report.status.to_db_string(),
            score,
            report.created_at,
            report.url
        );
    }
    println!("\nShowing {} of {} reports", reports.len(), total);

    Ok(())
}

/// Handles `show`
fn handle_show(config: &Config, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_config_store(config)?;
    let report = store.get_report(id)?;

    println!("Report {}", report.id);
    println!("  URL: {}", report.url);
    println!("  Status: {}", report.status);
    println!("  Created: {}", report.created_at);
    if let Some(completed) = &report.completed_at {
        println!("  Finished: {}", completed);
    }
    if let Some(message) = &report.error_message {
        let stage = report.error_stage.as_deref().unwrap_or("unknown");
        println!("  Error ({}): {}", stage, message);
    }

    if let Some(analysis) = &report.analysis {
        let score = &analysis.score_result;
        println!("\nScore: {:.1}/100 (Grade {})", score.overall, score.grade);
        for (name, value) in score.sub_scores.named() {
            println!("  {:<18} {:>5.1}", name, value);
        }
        println!(
            "\nBroken links: {} of {} checked",
            analysis.audit_result.broken_links_count(),
            analysis.audit_result.links_checked
        );
        if !score.issues.is_empty() {
            println!("\nIssues:");
            for issue in &score.issues {
                println!("  - {}", issue);
            }
        }
    }

    for degradation in &report.degradations {
        println!("  ! {}", degradation);
    }

    if let Some(insights) = &report.insights {
        println!("\nSummary:\n{}", insights.summary);
        if !insights.recommendations.is_empty() {
            println!("\nRecommendations:");
            for (i, recommendation) in insights.recommendations.iter().enumerate() {
                println!("  {}. {}", i + 1, recommendation);
            }
        }
    }

    Ok(())
}

/// Handles `export`
fn handle_export(
    config: &Config,
    id: i64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_config_store(config)?;
    let report = store.get_report(id)?;

    let path =
        output.unwrap_or_else(|| report_file_path(Path::new(&config.output.reports_dir), id));
    write_report_markdown(&report, &path)?;

    println!("✓ Report exported to: {}", path.display());
    Ok(())
}

/// Handles `delete`
fn handle_delete(config: &Config, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_config_store(config)?;
    store.delete_report(id)?;

    println!("✓ Deleted report {}", id);
    Ok(())
}
