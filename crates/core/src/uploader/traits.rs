//! Trait definitions for the uploader module.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::UploadError;
use super::types::{UploadJob, UploadProgress, UploadResult};
use crate::credentials::AccessToken;

/// Pushes local files into remote storage.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Returns the name of this uploader implementation.
    fn name(&self) -> &str;

    /// Uploads one file, returning once the remote object is committed.
    async fn upload(
        &self,
        job: &UploadJob,
        credential: &AccessToken,
    ) -> Result<UploadResult, UploadError>;

    /// Uploads with progress reporting.
    ///
    /// If the receiver is dropped, the upload continues without progress.
    async fn upload_with_progress(
        &self,
        job: &UploadJob,
        credential: &AccessToken,
        progress_tx: mpsc::Sender<UploadProgress>,
    ) -> Result<UploadResult, UploadError>;
}
