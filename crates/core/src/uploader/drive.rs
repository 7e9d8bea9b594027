//! Google Drive resumable uploader.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LOCATION, RANGE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::io::SeekFrom;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::config::UploaderConfig;
use super::error::UploadError;
use super::traits::Uploader;
use super::types::{UploadJob, UploadProgress, UploadResult};
use crate::credentials::AccessToken;

/// File resource returned once the last chunk is committed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: Option<String>,
    md5_checksum: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    error: DriveErrorDetail,
}

#[derive(Debug, Deserialize)]
struct DriveErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<DriveErrorReason>,
}

#[derive(Debug, Deserialize)]
struct DriveErrorReason {
    #[serde(default)]
    reason: String,
}

const QUOTA_REASONS: &[&str] = &[
    "storageQuotaExceeded",
    "quotaExceeded",
    "userRateLimitExceeded",
    "rateLimitExceeded",
    "dailyLimitExceeded",
];

/// Uploader for Google Drive v3 using resumable sessions.
pub struct DriveUploader {
    client: Client,
    config: UploaderConfig,
}

impl DriveUploader {
    /// Creates a new uploader with the given configuration.
    pub fn new(config: UploaderConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn session_url(&self) -> String {
        format!(
            "{}/upload/drive/v3/files?uploadType=resumable&supportsAllDrives=true&fields=id,name,md5Checksum",
            self.config.api_base_url.trim_end_matches('/')
        )
    }

    /// Opens a resumable session and returns its URI.
    async fn start_session(
        &self,
        job: &UploadJob,
        credential: &AccessToken,
        total_bytes: u64,
    ) -> Result<String, UploadError> {
        let metadata = serde_json::json!({
            "name": job.file_name,
            "parents": [job.folder_id],
        });

        let response = self
            .client
            .post(self.session_url())
            .header(AUTHORIZATION, format!("Bearer {}", credential.secret()))
            .header("X-Upload-Content-Type", &job.mime_type)
            .header("X-Upload-Content-Length", total_bytes)
            .json(&metadata)
            .send()
            .await
            .map_err(|e| UploadError::SessionFailed {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(error_for_response(response, Some(&job.folder_id)).await);
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(UploadError::MissingSessionUri)
    }

    async fn run_upload(
        &self,
        job: &UploadJob,
        credential: &AccessToken,
        progress_tx: Option<mpsc::Sender<UploadProgress>>,
    ) -> Result<UploadResult, UploadError> {
        let start = Instant::now();

        let metadata = tokio::fs::metadata(&job.local_path)
            .await
            .map_err(|_| UploadError::SourceNotFound {
                path: job.local_path.clone(),
            })?;
        let total_bytes = metadata.len();
        let mut file = tokio::fs::File::open(&job.local_path).await?;

        let session_uri = self.start_session(job, credential, total_bytes).await?;
        debug!("Opened upload session for {}", job.file_name);

        let chunk_size = self.config.chunk_size_bytes.max(1) as u64;
        let mut buf = Vec::with_capacity(chunk_size as usize);
        let mut digest = md5::Context::new();
        let mut hashed_upto = 0u64;
        let mut offset = 0u64;

        loop {
            let len = chunk_size.min(total_bytes - offset);

            buf.clear();
            file.seek(SeekFrom::Start(offset)).await?;
            (&mut file).take(len).read_to_end(&mut buf).await?;
            let len = buf.len() as u64;

            // Only hash bytes not seen before; a short commit re-sends a tail
            if offset + len > hashed_upto {
                digest.consume(&buf[(hashed_upto - offset) as usize..]);
                hashed_upto = offset + len;
            }

            let content_range = if total_bytes == 0 {
                "bytes */0".to_string()
            } else {
                format!("bytes {}-{}/{}", offset, offset + len - 1, total_bytes)
            };

            let response = self
                .client
                .put(&session_uri)
                .header(AUTHORIZATION, format!("Bearer {}", credential.secret()))
                .header(CONTENT_LENGTH, len)
                .header(CONTENT_RANGE, &content_range)
                .header(CONTENT_TYPE, &job.mime_type)
                .body(buf.clone())
                .send()
                .await?;

            match response.status() {
                StatusCode::OK | StatusCode::CREATED => {
                    let remote: DriveFile = response.json().await?;

                    if let Some(ref tx) = progress_tx {
                        let _ = tx.try_send(UploadProgress {
                            bytes_sent: total_bytes,
                            total_bytes,
                        });
                    }

                    let local_md5 = format!("{:x}", digest.compute());
                    if self.config.verify_checksum {
                        if let Some(remote_md5) = &remote.md5_checksum {
                            if !remote_md5.eq_ignore_ascii_case(&local_md5) {
                                return Err(UploadError::ChecksumMismatch {
                                    file_name: job.file_name.clone(),
                                    expected: local_md5,
                                    actual: remote_md5.clone(),
                                });
                            }
                        }
                    }

                    info!(
                        "Uploaded {} as {} ({} bytes in {}ms)",
                        job.file_name,
                        remote.id,
                        total_bytes,
                        start.elapsed().as_millis()
                    );

                    return Ok(UploadResult {
                        remote_object_id: remote.id,
                        file_name: remote.name.unwrap_or_else(|| job.file_name.clone()),
                        size_bytes: total_bytes,
                        md5_checksum: remote.md5_checksum.or(Some(local_md5)),
                    });
                }
                StatusCode::PERMANENT_REDIRECT => {
                    let committed = committed_offset(&response);
                    if committed <= offset {
                        return Err(UploadError::api(
                            308,
                            format!("upload made no progress at byte {}", offset),
                        ));
                    }
                    if committed > offset + len {
                        return Err(UploadError::api(
                            308,
                            format!(
                                "storage reported {} committed bytes after {} were sent",
                                committed,
                                offset + len
                            ),
                        ));
                    }
                    if committed < offset + len {
                        warn!(
                            "Storage committed {} of {} bytes, resending tail",
                            committed,
                            offset + len
                        );
                    }
                    offset = committed.min(total_bytes);

                    if let Some(ref tx) = progress_tx {
                        let _ = tx.try_send(UploadProgress {
                            bytes_sent: offset,
                            total_bytes,
                        });
                    }
                }
                _ => return Err(error_for_response(response, None).await),
            }
        }
    }
}

/// Offset after the last committed byte, from a `Range: bytes=0-N` header.
fn committed_offset(response: &Response) -> u64 {
    response
        .headers()
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit('-').next())
        .and_then(|end| end.trim().parse::<u64>().ok())
        .map(|end| end + 1)
        .unwrap_or(0)
}

/// Maps a non-success response onto an [`UploadError`].
///
/// `folder_id` is set for the session request, where a 404 means the
/// destination folder is unknown.
async fn error_for_response(response: Response, folder_id: Option<&str>) -> UploadError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<DriveErrorBody>(&body).ok();

    let message = parsed
        .as_ref()
        .map(|b| b.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.clone());
    let quota = parsed
        .as_ref()
        .is_some_and(|b| b.error.errors.iter().any(|e| QUOTA_REASONS.contains(&e.reason.as_str())));

    match (status, folder_id) {
        (StatusCode::UNAUTHORIZED, _) => UploadError::Unauthorized { message },
        (StatusCode::FORBIDDEN, _) | (StatusCode::TOO_MANY_REQUESTS, _) if quota => {
            UploadError::QuotaExceeded { message }
        }
        (StatusCode::NOT_FOUND, Some(folder_id)) => UploadError::FolderNotFound {
            folder_id: folder_id.to_string(),
        },
        _ => UploadError::api(status.as_u16(), message),
    }
}

#[async_trait]
impl Uploader for DriveUploader {
    fn name(&self) -> &str {
        "google-drive"
    }

    async fn upload(
        &self,
        job: &UploadJob,
        credential: &AccessToken,
    ) -> Result<UploadResult, UploadError> {
        self.run_upload(job, credential, None).await
    }

    async fn upload_with_progress(
        &self,
        job: &UploadJob,
        credential: &AccessToken,
        progress_tx: mpsc::Sender<UploadProgress>,
    ) -> Result<UploadResult, UploadError> {
        self.run_upload(job, credential, Some(progress_tx)).await
    }
}
