//! HTTP API tests against an in-process router with mock collaborators.

mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use common::{TestConfig, TestFixture};
use drivedrop_core::{AuthError, FetchError, UploadError};

#[tokio::test]
async fn test_background_mode_responds_before_job_finishes() {
    let fixture = TestFixture::new().await;
    fixture
        .fetcher
        .set_fetch_duration(Duration::from_millis(500))
        .await;
    fixture.uploader.set_remote_id("abc123").await;

    let start = Instant::now();
    let response = fixture
        .get("/download?url=https://example.com/video1&quality=best")
        .await;
    assert_status!(response, StatusCode::ACCEPTED);
    assert!(start.elapsed() < Duration::from_millis(500));

    assert_eq!(response.body["status"], "processing");
    assert!(response.body["message"].as_str().unwrap().contains("background"));
    assert_eq!(response.body["details"]["url"], "https://example.com/video1");
    assert_eq!(response.body["details"]["quality"], "best");
    assert!(response.body["details"]["job_id"].is_string());

    // Nothing has been uploaded yet
    assert_eq!(fixture.uploader.upload_count().await, 0);

    assert!(fixture.wait_for_finished_jobs(1).await);
    assert_eq!(fixture.orchestrator.status().completed_jobs, 1);
    assert_eq!(fixture.uploader.upload_count().await, 1);
    assert_eq!(fixture.working_dir_entries(), 0);
}

#[tokio::test]
async fn test_background_mode_uses_default_quality() {
    let fixture = TestFixture::with_config(TestConfig {
        default_quality: "bestaudio".to_string(),
        ..TestConfig::default()
    })
    .await;

    let response = fixture.get("/download?url=https://example.com/video1").await;
    assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(response.body["details"]["quality"], "bestaudio");

    assert!(fixture.wait_for_finished_jobs(1).await);
    let requests = fixture.fetcher.recorded_requests().await;
    assert_eq!(requests[0].quality, "bestaudio");
}

#[tokio::test]
async fn test_background_mode_failure_reports_nothing_further() {
    let fixture = TestFixture::new().await;
    fixture
        .fetcher
        .set_next_error(FetchError::extraction_failed("unsupported host", None))
        .await;

    let response = fixture.get("/download?url=https://example.com/video1").await;
    assert_status!(response, StatusCode::ACCEPTED);

    assert!(fixture.wait_for_finished_jobs(1).await);
    assert_eq!(fixture.orchestrator.status().failed_jobs, 1);
    assert_eq!(fixture.uploader.upload_count().await, 0);
}

#[tokio::test]
async fn test_missing_or_empty_url_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/download").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("url"));

    let response = fixture.get("/download?url=&quality=best").await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    assert_eq!(fixture.fetcher.fetch_count().await, 0);
}

#[tokio::test]
async fn test_synchronous_success() {
    let fixture = TestFixture::with_config(TestConfig::synchronous()).await;
    fixture.fetcher.set_title("clip").await;
    fixture.uploader.set_remote_id("abc123").await;

    let response = fixture
        .get("/download?url=https://example.com/video1&quality=best")
        .await;
    assert_status!(response, StatusCode::OK);

    assert_eq!(response.body["title"], "clip");
    assert_eq!(response.body["url"], "https://example.com/video1");
    assert_eq!(response.body["filename"], "clip.mp4");
    assert_eq!(response.body["quality"], "best");
    assert_eq!(response.body["drive_file_id"], "abc123");

    // Responded only after the job was terminal and cleaned up
    assert_eq!(fixture.orchestrator.status().completed_jobs, 1);
    assert_eq!(fixture.working_dir_entries(), 0);

    let uploads = fixture.uploader.recorded_uploads().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].job.folder_id, "folder-1");
}

#[tokio::test]
async fn test_synchronous_extraction_failure() {
    let fixture = TestFixture::with_config(TestConfig::synchronous()).await;
    fixture
        .fetcher
        .set_next_error(FetchError::extraction_failed("unsupported host", None))
        .await;

    let response = fixture.get("/download?url=https://example.com/video1").await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["stage"], "extraction");
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("unsupported host"));
    assert_eq!(fixture.uploader.upload_count().await, 0);
}

#[tokio::test]
async fn test_synchronous_invalid_url() {
    let fixture = TestFixture::with_config(TestConfig::synchronous()).await;

    let response = fixture.get("/download?url=ftp://example.com/file").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["stage"], "extraction");
    assert_eq!(fixture.uploader.upload_count().await, 0);
}

#[tokio::test]
async fn test_synchronous_upload_failure_cleans_up() {
    let fixture = TestFixture::with_config(TestConfig::synchronous()).await;
    fixture
        .uploader
        .set_next_error(UploadError::QuotaExceeded {
            message: "storage full".to_string(),
        })
        .await;

    let response = fixture.get("/download?url=https://example.com/video1").await;
    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["stage"], "upload");
    assert!(response.body["error"].as_str().unwrap().contains("storage full"));
    assert_eq!(fixture.working_dir_entries(), 0);
}

#[tokio::test]
async fn test_synchronous_credential_failure() {
    let fixture = TestFixture::with_config(TestConfig::synchronous()).await;
    fixture
        .credentials
        .set_next_error(AuthError::Rejected("invalid_grant".to_string()))
        .await;

    let response = fixture.get("/download?url=https://example.com/video1").await;
    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["stage"], "auth");
    assert_eq!(fixture.uploader.upload_count().await, 0);
    assert_eq!(fixture.working_dir_entries(), 0);
}

#[tokio::test]
async fn test_javascript_response_format() {
    let fixture = TestFixture::with_config(TestConfig::default().javascript()).await;

    let response = fixture.get("/download?url=https://example.com/video1").await;
    assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(
        response.content_type.as_deref(),
        Some("application/javascript")
    );
    assert!(response.text.starts_with("export default {"));
    assert!(response.text.trim_end().ends_with("};"));
    assert!(response.text.contains("\"status\":\"processing\""));
}

#[tokio::test]
async fn test_javascript_synchronous_success() {
    let fixture =
        TestFixture::with_config(TestConfig::synchronous().javascript()).await;
    fixture.uploader.set_remote_id("abc123").await;

    let response = fixture.get("/download?url=https://example.com/video1").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.starts_with("export default {"));
    assert!(response.text.contains("\"drive_file_id\":\"abc123\""));
}

#[tokio::test]
async fn test_health_config_and_status_endpoints() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["storage"]["folder_id"], "folder-1");
    assert_eq!(response.body["storage"]["credentials"]["method"], "oauth");
    assert_eq!(
        response.body["storage"]["credentials"]["refresh_token_configured"],
        true
    );
    assert!(!response.text.contains("refresh-token"));
    assert!(!response.text.contains("client-secret"));
    assert_eq!(response.body["jobs"]["mode"], "background");

    let response = fixture.get("/api/v1/jobs/status").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["active_jobs"], 0);
    assert_eq!(response.body["completed_jobs"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("drivedrop_http_requests_total"));
    assert!(response.text.contains("drivedrop_jobs_active"));
}
