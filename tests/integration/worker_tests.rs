//! Integration tests for the report worker
//!
//! These tests drive reports through their full lifecycle against a
//! temporary SQLite database and wiremock servers.

use site_sage::config::Config;
use site_sage::crawler::Pipeline;
use site_sage::insights::ChatInsightGenerator;
use site_sage::output::{report_file_path, write_report_markdown};
use site_sage::storage::{ReportStore, SqliteReportStore, StorageError};
use site_sage::worker::{JobOutcome, ReportWorker};
use site_sage::{PipelineStage, ReportStatus};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html>
<head>
    <title>A well sized title for the worker test page</title>
    <meta name="description" content="Short description">
</head>
<body>
    <h1>Worker</h1>
    <h2>Section</h2>
    <img src="/logo.png" alt="Logo">
    <a href="/ok">Fine</a>
    <a href="/missing">Broken</a>
</body>
</html>"#;

async fn start_site() -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mock_server
}

fn open_store(dir: &TempDir) -> Arc<Mutex<SqliteReportStore>> {
    let store = SqliteReportStore::new(&dir.path().join("reports.db")).unwrap();
    Arc::new(Mutex::new(store))
}

fn spawn_worker(
    store: Arc<Mutex<SqliteReportStore>>,
    generator: Option<ChatInsightGenerator>,
) -> ReportWorker<SqliteReportStore> {
    let pipeline = Pipeline::new(&Config::default()).unwrap();
    ReportWorker::spawn(pipeline, store, generator, 8)
}

#[tokio::test]
async fn test_completed_report_lifecycle() {
    let site = start_site().await;
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let worker = spawn_worker(store.clone(), None);

    let ticket = worker.submit(&site.uri(), false).await.unwrap();
    let outcome = ticket.outcome.await.unwrap().unwrap();

    let overall = match outcome {
        JobOutcome::Completed {
            report_id,
            overall_score,
            ref degradations,
        } => {
            assert_eq!(report_id, ticket.report_id);
            assert!(degradations.is_empty());
            overall_score
        }
        other => panic!("unexpected outcome: {:?}", other),
    };

    let report = store.lock().unwrap().get_report(ticket.report_id).unwrap();
    assert_eq!(report.status, ReportStatus::Completed);
    assert_eq!(report.seo_score, Some(overall));
    assert!(report.completed_at.is_some());
    assert!(report.error_message.is_none());

    let analysis = report.analysis.as_ref().unwrap();
    assert_eq!(analysis.page_data.h1_tags, vec!["Worker"]);
    assert_eq!(analysis.audit_result.links_checked, 2);
    assert_eq!(analysis.audit_result.broken_links_count(), 1);
    assert_eq!(
        analysis.audit_result.broken_links[0].url,
        format!("{}/missing", site.uri())
    );
    assert!((analysis.score_result.sub_scores.links - 50.0).abs() < 1e-9);

    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_report_records_stage() {
    let site = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let worker = spawn_worker(store.clone(), None);

    let ticket = worker.submit(&site.uri(), false).await.unwrap();
    let outcome = ticket.outcome.await.unwrap().unwrap();

    match outcome {
        JobOutcome::Failed { stage, message, .. } => {
            assert_eq!(stage, PipelineStage::Fetching);
            assert!(message.contains("503"), "{}", message);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let report = store.lock().unwrap().get_report(ticket.report_id).unwrap();
    assert_eq!(report.status, ReportStatus::Failed);
    assert_eq!(report.error_stage.as_deref(), Some("fetching"));
    assert!(report.analysis.is_none());

    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_insight_failure_still_completes() {
    let site = start_site().await;
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&llm)
        .await;

    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let generator =
        ChatInsightGenerator::new(reqwest::Client::new(), llm.uri(), "key", "test-model", 0.7);
    let worker = spawn_worker(store.clone(), Some(generator));

    let ticket = worker.submit(&site.uri(), true).await.unwrap();
    let outcome = ticket.outcome.await.unwrap().unwrap();
    assert!(matches!(outcome, JobOutcome::Completed { ref degradations, .. } if degradations.len() == 1));

    let report = store.lock().unwrap().get_report(ticket.report_id).unwrap();
    assert_eq!(report.status, ReportStatus::Completed);
    assert!(report.insights.is_none());
    assert_eq!(report.degradations.len(), 1);

    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_jobs_without_insights_skip_generator() {
    let site = start_site().await;
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&llm)
        .await;

    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let generator =
        ChatInsightGenerator::new(reqwest::Client::new(), llm.uri(), "key", "test-model", 0.7);
    let worker = spawn_worker(store.clone(), Some(generator));

    let ticket = worker.submit(&site.uri(), false).await.unwrap();
    let outcome = ticket.outcome.await.unwrap().unwrap();
    assert!(matches!(outcome, JobOutcome::Completed { .. }));

    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_queue_list_export_and_delete() {
    let site = start_site().await;
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let worker = spawn_worker(store.clone(), None);

    let mut tickets = Vec::new();
    for _ in 0..3 {
        tickets.push(worker.submit(&site.uri(), false).await.unwrap());
    }
    let ids: Vec<i64> = tickets.iter().map(|ticket| ticket.report_id).collect();
    for ticket in tickets {
        let outcome = ticket.outcome.await.unwrap().unwrap();
        assert!(matches!(outcome, JobOutcome::Completed { .. }));
    }
    worker.shutdown().await.unwrap();

    let mut store = store.lock().unwrap();
    assert_eq!(store.count_reports().unwrap(), 3);

    let listed: Vec<i64> = store
        .list_reports(0, 10)
        .unwrap()
        .iter()
        .map(|summary| summary.id)
        .collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let report = store.get_report(ids[0]).unwrap();
    let export_path = report_file_path(&dir.path().join("exports"), ids[0]);
    write_report_markdown(&report, &export_path).unwrap();
    let markdown = std::fs::read_to_string(&export_path).unwrap();
    assert!(markdown.contains(&format!("- **Report ID**: {}", ids[0])));
    assert!(markdown.contains("## Broken Links"));

    store.delete_report(ids[0]).unwrap();
    assert!(matches!(
        store.get_report(ids[0]),
        Err(StorageError::ReportNotFound(_))
    ));
    assert_eq!(store.count_reports().unwrap(), 2);
}

#[tokio::test]
async fn test_report_survives_reopen() {
    let site = start_site().await;
    let dir = TempDir::new().unwrap();

    let report_id = {
        let store = open_store(&dir);
        let worker = spawn_worker(store.clone(), None);
        let ticket = worker.submit(&site.uri(), false).await.unwrap();
        ticket.outcome.await.unwrap().unwrap();
        worker.shutdown().await.unwrap();
        ticket.report_id
    };

    let reopened = SqliteReportStore::new(&dir.path().join("reports.db")).unwrap();
    let report = reopened.get_report(report_id).unwrap();
    assert_eq!(report.status, ReportStatus::Completed);
    assert!(report.analysis.is_some());
}
