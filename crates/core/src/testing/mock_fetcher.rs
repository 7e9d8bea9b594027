//! Mock fetcher for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{DownloadRequest, FetchError, FetchResult, Fetcher};

/// Mock implementation of the Fetcher trait.
///
/// Writes a real file into its working directory so cleanup can be observed.
///
/// # Example
///
/// ```rust,ignore
/// use drivedrop_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new(temp.path());
/// fetcher.set_title("Clip").await;
///
/// let result = fetcher.fetch(&request).await?;
/// assert!(result.local_path.exists());
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    working_dir: PathBuf,
    /// Recorded requests.
    requests: Arc<RwLock<Vec<DownloadRequest>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
    /// Title of the fetched item; also names the file.
    title: Arc<RwLock<String>>,
    /// Bytes written per fetch.
    content: Arc<RwLock<Vec<u8>>>,
    /// Simulated fetch duration in milliseconds.
    fetch_duration_ms: Arc<RwLock<u64>>,
}

impl MockFetcher {
    /// Create a new mock fetcher writing into `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            title: Arc::new(RwLock::new("Mock Video".to_string())),
            content: Arc::new(RwLock::new(b"mock media".to_vec())),
            fetch_duration_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<DownloadRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the title reported for fetched items.
    pub async fn set_title(&self, title: impl Into<String>) {
        *self.title.write().await = title.into();
    }

    /// Set the bytes written for fetched items.
    pub async fn set_content(&self, content: impl Into<Vec<u8>>) {
        *self.content.write().await = content.into();
    }

    /// Set the simulated fetch duration.
    pub async fn set_fetch_duration(&self, duration: Duration) {
        *self.fetch_duration_ms.write().await = duration.as_millis() as u64;
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: &DownloadRequest) -> Result<FetchResult, FetchError> {
        self.requests.write().await.push(request.clone());

        let duration_ms = *self.fetch_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        request.parsed_url()?;

        let title = self.title.read().await.clone();
        let content = self.content.read().await.clone();
        let local_path = self.working_dir.join(format!("{}.mp4", title));
        tokio::fs::write(&local_path, &content).await?;

        Ok(FetchResult {
            title,
            local_path,
            size_bytes: content.len() as u64,
        })
    }

    async fn validate(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
