//! Error types for the uploader module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while uploading to remote storage.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Local file to upload does not exist.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The access token was rejected (expired or revoked).
    #[error("Storage rejected the credential: {message}")]
    Unauthorized { message: String },

    /// Destination folder does not exist or is not shared with the identity.
    #[error("Destination folder not found: {folder_id}")]
    FolderNotFound { folder_id: String },

    /// Storage quota or rate limit exhausted.
    #[error("Storage quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Any other non-success API response.
    #[error("Storage API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The resumable session could not be started.
    #[error("Failed to start upload session: {reason}")]
    SessionFailed { reason: String },

    /// The session response carried no `Location` header.
    #[error("Upload session response is missing the session URI")]
    MissingSessionUri,

    /// Remote checksum does not match the bytes sent.
    #[error("Checksum mismatch for {file_name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file_name: String,
        expected: String,
        actual: String,
    },

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error reading the local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Creates an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure came from the credential rather than the data.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
