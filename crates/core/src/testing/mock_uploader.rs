//! Mock uploader for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::credentials::AccessToken;
use crate::uploader::{UploadError, UploadJob, UploadProgress, UploadResult, Uploader};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    /// The job that was submitted.
    pub job: UploadJob,
    /// Access token the upload was authorized with.
    pub token: String,
    /// Whether the local file existed when the upload started.
    pub source_existed: bool,
    /// Whether the upload succeeded.
    pub success: bool,
}

/// Mock implementation of the Uploader trait.
#[derive(Debug)]
pub struct MockUploader {
    /// Recorded uploads.
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// If set, the next upload will fail with this error.
    next_error: Arc<RwLock<Option<UploadError>>>,
    /// Fixed remote id; generated per upload when unset.
    remote_id: Arc<RwLock<Option<String>>>,
    /// Simulated upload duration in milliseconds.
    upload_duration_ms: Arc<RwLock<u64>>,
    counter: AtomicU64,
}

impl Default for MockUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUploader {
    /// Create a new mock uploader.
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            remote_id: Arc::new(RwLock::new(None)),
            upload_duration_ms: Arc::new(RwLock::new(0)),
            counter: AtomicU64::new(0),
        }
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Get the number of uploads attempted.
    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    /// Configure the next upload to fail with the given error.
    pub async fn set_next_error(&self, error: UploadError) {
        *self.next_error.write().await = Some(error);
    }

    /// Return this id for every successful upload.
    pub async fn set_remote_id(&self, id: impl Into<String>) {
        *self.remote_id.write().await = Some(id.into());
    }

    /// Set the simulated upload duration.
    pub async fn set_upload_duration(&self, duration: Duration) {
        *self.upload_duration_ms.write().await = duration.as_millis() as u64;
    }
}

#[async_trait]
impl Uploader for MockUploader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(
        &self,
        job: &UploadJob,
        credential: &AccessToken,
    ) -> Result<UploadResult, UploadError> {
        let metadata = tokio::fs::metadata(&job.local_path).await.ok();
        let mut record = RecordedUpload {
            job: job.clone(),
            token: credential.secret().to_string(),
            source_existed: metadata.is_some(),
            success: false,
        };

        let duration_ms = *self.upload_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            self.uploads.write().await.push(record);
            return Err(err);
        }

        let Some(metadata) = metadata else {
            self.uploads.write().await.push(record);
            return Err(UploadError::SourceNotFound {
                path: job.local_path.clone(),
            });
        };

        let remote_object_id = match self.remote_id.read().await.clone() {
            Some(id) => id,
            None => format!("mock-file-{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1),
        };

        record.success = true;
        self.uploads.write().await.push(record);

        Ok(UploadResult {
            remote_object_id,
            file_name: job.file_name.clone(),
            size_bytes: metadata.len(),
            md5_checksum: None,
        })
    }

    async fn upload_with_progress(
        &self,
        job: &UploadJob,
        credential: &AccessToken,
        progress_tx: mpsc::Sender<UploadProgress>,
    ) -> Result<UploadResult, UploadError> {
        let result = self.upload(job, credential).await?;
        let _ = progress_tx
            .send(UploadProgress {
                bytes_sent: result.size_bytes,
                total_bytes: result.size_bytes,
            })
            .await;
        Ok(result)
    }
}
