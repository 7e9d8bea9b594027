//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting media from a source URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source URL is malformed or uses an unsupported scheme.
    #[error("Invalid source URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The yt-dlp binary could not be started.
    #[error("yt-dlp not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The URL resolved to a playlist.
    #[error("Playlists are not supported: {url}")]
    PlaylistNotSupported { url: String },

    /// yt-dlp ran but could not extract or download the media.
    #[error("Extraction failed: {reason}")]
    ExtractionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// yt-dlp reported a file that does not exist.
    #[error("Downloaded file not found: {path}")]
    OutputMissing { path: PathBuf },

    /// Extraction timed out.
    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to parse the yt-dlp info document.
    #[error("Failed to parse extractor output: {reason}")]
    ParseError { reason: String },

    /// I/O error while running the extractor.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an extraction failed error with stderr output.
    pub fn extraction_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ExtractionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether the request itself was at fault, as opposed to the source
    /// host or the extractor.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::PlaylistNotSupported { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::extraction_failed("unsupported host", None);
        assert_eq!(err.to_string(), "Extraction failed: unsupported host");

        let err = FetchError::invalid_url("ftp://x", "scheme must be http or https");
        assert!(err.to_string().contains("ftp://x"));
    }

    #[test]
    fn test_request_errors() {
        assert!(FetchError::invalid_url("x", "y").is_request_error());
        assert!(FetchError::PlaylistNotSupported {
            url: "https://example.com/list".to_string()
        }
        .is_request_error());
        assert!(!FetchError::Timeout { timeout_secs: 5 }.is_request_error());
    }
}
