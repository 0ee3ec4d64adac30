//! Integration tests for the analysis pipeline
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, extract, audit and score cycle end-to-end.

use site_sage::config::Config;
use site_sage::crawler::{AuditStatus, Degradation, PageData, Pipeline, ProbeFailure};
use site_sage::insights::{
    ChatInsightGenerator, InsightError, InsightGenerator, Insights,
};
use site_sage::scoring::{Grade, ScoreResult};
use site_sage::{AuditResult, FetchError, PipelineError, PipelineStage};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.fetcher.request_timeout_ms = 5_000;
    config.audit.probe_timeout_ms = 2_000;
    config.insights.timeout_ms = 2_000;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// Generator that answers after a fixed delay
struct SlowGenerator {
    delay: Duration,
}

impl InsightGenerator for SlowGenerator {
    async fn generate(
        &self,
        _page: &PageData,
        _audit: &AuditResult,
        _score: &ScoreResult,
    ) -> Result<Insights, InsightError> {
        tokio::time::sleep(self.delay).await;
        Ok(Insights {
            summary: "Too late.".to_string(),
            recommendations: vec![],
            model_used: None,
        })
    }
}

#[tokio::test]
async fn test_minimal_page_scores() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(path("/"))
        .respond_with(html_response(format!(
            r#"<html><head><title>Example Domain</title></head><body>
            <p>This domain is for use in illustrative examples.</p>
            <a href="{}/more">More information...</a>
            </body></html>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;
    Mock::given(path("/more"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let result = pipeline.run(&format!("{}/", base_url)).await.unwrap();

    let page = &result.page_data;
    assert_eq!(page.title.as_deref(), Some("Example Domain"));
    assert!(page.meta_description.is_none());
    assert!(page.h1_tags.is_empty());
    assert!(page.h2_tags.is_empty());
    assert_eq!(page.internal_links, vec![format!("{}/more", base_url)]);
    assert!(page.external_links.is_empty());
    assert!(page.page_size_bytes > 0);
    assert!(page.load_time_seconds < 1.0);

    assert!(result.audit_result.is_complete());
    assert_eq!(result.audit_result.links_checked, 1);
    assert_eq!(result.audit_result.broken_links_count(), 0);

    let scores = result.score_result.sub_scores;
    assert_eq!(scores.title, 70.0);
    assert_eq!(scores.meta_description, 0.0);
    assert_eq!(scores.headings, 20.0);
    assert_eq!(scores.images, 100.0);
    assert_eq!(scores.links, 100.0);
    assert_eq!(scores.performance, 100.0);
    assert_eq!(result.score_result.overall, 64.5);
    assert_eq!(result.score_result.grade, Grade::D);

    assert!(result.insights.is_none());
    assert!(!result.is_degraded());
}

#[tokio::test]
async fn test_fetch_timeout_is_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(
            html_response("<html></html>".to_string()).set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.fetcher.request_timeout_ms = 200;
    let pipeline = Pipeline::new(&config).unwrap();

    let err = pipeline.run(&mock_server.uri()).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Fetch(FetchError::Timeout { .. })
    ));
    assert_eq!(err.stage(), PipelineStage::Fetching);
}

#[tokio::test]
async fn test_primary_http_error_is_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let err = pipeline
        .run(&format!("{}/gone", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Fetch(FetchError::HttpStatus { status: 404, .. })
    ));
    assert_eq!(err.stage(), PipelineStage::Fetching);
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let pipeline = Pipeline::new(&create_test_config()).unwrap();

    for input in ["", "example.com", "mailto:someone@example.com", "http://"] {
        let err = pipeline.run(input).await.unwrap_err();
        assert!(
            matches!(err, PipelineError::InvalidUrl(_)),
            "{:?} should be invalid",
            input
        );
        assert_eq!(err.stage(), PipelineStage::NotStarted);
    }
}

#[tokio::test]
async fn test_oversized_page_is_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html_response("x".repeat(8 * 1024)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.fetcher.max_page_bytes = 1024;
    let pipeline = Pipeline::new(&config).unwrap();

    let err = pipeline.run(&mock_server.uri()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Fetch(FetchError::TooLarge { limit: 1024, .. })
    ));
}

#[tokio::test]
async fn test_unreachable_host_is_fatal() {
    // Bind then drop to get a local port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let err = pipeline
        .run(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();

    assert!(
        matches!(err, PipelineError::Fetch(FetchError::Connection { .. })),
        "{:?}",
        err
    );
    assert_eq!(err.stage(), PipelineStage::Fetching);
}

#[tokio::test]
async fn test_unresolvable_host_is_fatal() {
    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let err = pipeline
        .run("http://site-sage-test.invalid/")
        .await
        .unwrap_err();

    assert!(
        matches!(err, PipelineError::Fetch(FetchError::Dns { .. })),
        "{:?}",
        err
    );
    assert_eq!(err.stage(), PipelineStage::Fetching);
}

#[tokio::test]
async fn test_redirect_loop_is_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/loop"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/loop", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.fetcher.max_redirects = 1;
    let pipeline = Pipeline::new(&config).unwrap();

    let err = pipeline
        .run(&format!("{}/loop", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(
        matches!(err, PipelineError::Fetch(FetchError::RedirectLimit { .. })),
        "{:?}",
        err
    );
    assert_eq!(err.stage(), PipelineStage::Fetching);
}

#[tokio::test]
async fn test_trailing_slash_link_is_probed_as_written() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(path("/"))
        .respond_with(html_response(
            r#"<html><body><a href="/docs/">Docs</a></body></html>"#.to_string(),
        ))
        .mount(&mock_server)
        .await;
    Mock::given(path("/docs/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(path("/docs"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let result = pipeline.run(&base_url).await.unwrap();

    assert_eq!(
        result.page_data.internal_links,
        vec![format!("{}/docs/", base_url)]
    );
    assert_eq!(result.audit_result.links_checked, 1);
    assert_eq!(result.audit_result.broken_links_count(), 0);
    assert_eq!(result.score_result.sub_scores.links, 100.0);
}

#[tokio::test]
async fn test_broken_links_lower_links_score() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let anchors: String = (0..10)
        .map(|i| format!(r#"<a href="/link/{}">Link {}</a>"#, i, i))
        .collect();
    Mock::given(path("/"))
        .respond_with(html_response(format!(
            "<html><head><title>Links</title></head><body>{}</body></html>",
            anchors
        )))
        .mount(&mock_server)
        .await;

    for i in 0..10 {
        let status = if [2, 5, 7].contains(&i) { 404 } else { 200 };
        Mock::given(path(format!("/link/{}", i)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
    }

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let result = pipeline.run(&base_url).await.unwrap();

    assert_eq!(result.page_data.total_links(), 10);
    assert_eq!(result.audit_result.links_checked, 10);

    let broken: Vec<&str> = result
        .audit_result
        .broken_links
        .iter()
        .map(|link| link.url.as_str())
        .collect();
    assert_eq!(
        broken,
        vec![
            format!("{}/link/2", base_url),
            format!("{}/link/5", base_url),
            format!("{}/link/7", base_url),
        ]
    );
    assert!(result
        .audit_result
        .broken_links
        .iter()
        .all(|link| link.internal && link.failure == ProbeFailure::HttpStatus(404)));

    assert!((result.score_result.sub_scores.links - 70.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_duplicate_links_are_probed_once() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/"))
        .respond_with(html_response(
            r##"<html><body>
            <a href="/about">About</a>
            <a href="/about/">About again</a>
            <a href="/about#team">Team</a>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">Nothing</a>
            </body></html>"##
                .to_string(),
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let result = pipeline.run(&mock_server.uri()).await.unwrap();

    assert_eq!(result.page_data.total_links(), 1);
    assert_eq!(result.audit_result.links_checked, 1);
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new/", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(path("/new/"))
        .respond_with(html_response(
            r#"<html><head><title>Moved</title></head><body><a href="child">Child</a></body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;
    Mock::given(path("/new/child"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let result = pipeline.run(&format!("{}/old", base_url)).await.unwrap();

    assert_eq!(result.requested_url, format!("{}/old", base_url));
    assert_eq!(result.page_data.url, format!("{}/new/", base_url));
    assert_eq!(
        result.page_data.internal_links,
        vec![format!("{}/new/child", base_url)]
    );
}

#[tokio::test]
async fn test_audit_failure_degrades_result() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html_response(
            r#"<html><head><title>Degraded</title></head><body><a href="/x">X</a></body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.audit.max_concurrent_probes = 0;
    let pipeline = Pipeline::new(&config).unwrap();

    let result = pipeline.run(&mock_server.uri()).await.unwrap();

    assert!(matches!(
        result.audit_result.status,
        AuditStatus::Skipped { .. }
    ));
    assert_eq!(result.audit_result.links_checked, 0);
    assert!(matches!(
        result.degradations.as_slice(),
        [Degradation::AuditSkipped { .. }]
    ));
    // Scoring still runs against an empty broken set
    assert_eq!(result.score_result.sub_scores.links, 100.0);
}

#[tokio::test]
async fn test_slow_insights_degrade_result() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html_response(
            "<html><head><title>Example Domain</title></head><body></body></html>".to_string(),
        ))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.insights.timeout_ms = 100;
    let pipeline = Pipeline::new(&config).unwrap();
    let generator = SlowGenerator {
        delay: Duration::from_secs(5),
    };

    let baseline = pipeline.run(&mock_server.uri()).await.unwrap();
    let result = pipeline
        .analyze(&mock_server.uri(), Some(&generator))
        .await
        .unwrap();

    assert!(result.insights.is_none());
    assert!(matches!(
        result.degradations.as_slice(),
        [Degradation::InsightsUnavailable { .. }]
    ));
    assert_eq!(result.score_result.overall, baseline.score_result.overall);
    assert_eq!(result.page_data.title, baseline.page_data.title);
}

#[tokio::test]
async fn test_insights_are_attached() {
    let site = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html_response(
            "<html><head><title>Example Domain</title></head><body></body></html>".to_string(),
        ))
        .mount(&site)
        .await;

    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "1. Add a meta description." } }]
        })))
        .expect(2)
        .mount(&llm)
        .await;

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let generator =
        ChatInsightGenerator::new(reqwest::Client::new(), llm.uri(), "key", "test-model", 0.7);

    let result = pipeline
        .analyze(&site.uri(), Some(&generator))
        .await
        .unwrap();

    let insights = result.insights.unwrap();
    assert_eq!(insights.recommendations, vec!["Add a meta description."]);
    assert_eq!(insights.model_used.as_deref(), Some("test-model"));
    assert!(result.degradations.is_empty());
}

#[tokio::test]
async fn test_pipeline_is_reusable() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html_response(
            "<html><head><title>Stable</title></head><body><h1>One</h1></body></html>"
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&create_test_config()).unwrap();
    let first = pipeline.run(&mock_server.uri()).await.unwrap();
    let second = pipeline.run(&mock_server.uri()).await.unwrap();

    assert_eq!(first.page_data.h1_tags, second.page_data.h1_tags);
    assert_eq!(
        first.score_result.sub_scores.headings,
        second.score_result.sub_scores.headings
    );
}
