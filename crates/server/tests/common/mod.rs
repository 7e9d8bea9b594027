//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock fetcher, uploader and credentials injected, so the HTTP layer
//! can be exercised without yt-dlp or Google.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use drivedrop_core::{
    config::{CredentialConfig, ServerConfig, StorageConfig, GOOGLE_TOKEN_URL},
    fetcher::FetcherConfig,
    testing::{MockCredentialProvider, MockFetcher, MockUploader},
    uploader::UploaderConfig,
    Config, InvocationMode, JobOrchestrator, OrchestratorConfig, ResponseFormat,
};
use drivedrop_server::{api::create_router, state::AppState};

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_download() {
///     let fixture = TestFixture::new().await;
///     fixture.uploader.set_remote_id("abc123").await;
///
///     let response = fixture.get("/download?url=https://example.com/v").await;
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Orchestrator behind the router, for status assertions
    pub orchestrator: JobOrchestrator,
    /// Mock fetcher - writes real files into the working directory
    pub fetcher: Arc<MockFetcher>,
    /// Mock uploader - records uploads, returns configured ids
    pub uploader: Arc<MockUploader>,
    /// Mock credentials - hands out a fixed token
    pub credentials: Arc<MockCredentialProvider>,
    /// Working directory for fetched files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture in background mode.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let fetcher = Arc::new(MockFetcher::new(temp_dir.path()));
        let uploader = Arc::new(MockUploader::new());
        let credentials = Arc::new(MockCredentialProvider::new());

        let jobs = OrchestratorConfig {
            mode: test_config.mode,
            response_format: test_config.response_format,
            default_quality: test_config.default_quality.clone(),
            max_concurrent_jobs: 0,
        };

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            storage: StorageConfig {
                folder_id: "folder-1".to_string(),
                credentials: CredentialConfig::Oauth {
                    client_id: "client-id".to_string(),
                    client_secret: Some("client-secret".to_string()),
                    refresh_token: "refresh-token".to_string(),
                    token_url: GOOGLE_TOKEN_URL.to_string(),
                },
            },
            fetcher: FetcherConfig::default().with_working_dir(temp_dir.path()),
            uploader: UploaderConfig::default(),
            jobs: jobs.clone(),
        };

        let orchestrator = JobOrchestrator::new(
            jobs,
            config.storage.folder_id.clone(),
            fetcher.clone(),
            uploader.clone(),
            credentials.clone(),
        );

        let state = Arc::new(AppState::new(config, orchestrator.clone()));
        let router = create_router(state);

        Self {
            router,
            orchestrator,
            fetcher,
            uploader,
            credentials,
            temp_dir,
        }
    }

    /// Send a GET request to the test router.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            content_type,
            text,
            body,
        }
    }

    /// Files currently in the working directory.
    pub fn working_dir_entries(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path()).unwrap().count()
    }

    /// Wait until `count` jobs reached a terminal state.
    pub async fn wait_for_finished_jobs(&self, count: u64) -> bool {
        for _ in 0..200 {
            let status = self.orchestrator.status();
            if status.completed_jobs + status.failed_jobs >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub mode: InvocationMode,
    pub response_format: ResponseFormat,
    pub default_quality: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            mode: InvocationMode::Background,
            response_format: ResponseFormat::Json,
            default_quality: "best".to_string(),
        }
    }
}

impl TestConfig {
    /// Create config that waits for jobs.
    pub fn synchronous() -> Self {
        Self {
            mode: InvocationMode::Synchronous,
            ..Self::default()
        }
    }

    /// Render responses as ES modules.
    pub fn javascript(mut self) -> Self {
        self.response_format = ResponseFormat::Javascript;
        self
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
