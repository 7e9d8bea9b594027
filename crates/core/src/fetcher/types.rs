//! Types for the fetcher module.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::FetchError;

/// Quality selector used when a request does not name one.
pub const DEFAULT_QUALITY: &str = "best";

/// One incoming download. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Page or media URL understood by the extractor.
    pub source_url: String,
    /// Opaque format selector handed to the extractor unchanged.
    pub quality: String,
}

impl DownloadRequest {
    pub fn new(source_url: impl Into<String>, quality: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            quality: quality.into(),
        }
    }

    /// Parse the source URL, accepting only absolute http(s) URLs with a host.
    pub fn parsed_url(&self) -> Result<Url, FetchError> {
        let url = Url::parse(self.source_url.trim())
            .map_err(|e| FetchError::invalid_url(&self.source_url, e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(
                &self.source_url,
                "scheme must be http or https",
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(FetchError::invalid_url(&self.source_url, "missing host"));
        }

        Ok(url)
    }
}

/// A file the fetcher left in the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    /// Title reported by the source.
    pub title: String,
    /// Where the media was written.
    pub local_path: PathBuf,
    /// Size on disk.
    pub size_bytes: u64,
}

impl FetchResult {
    /// Final path component, used as the remote file name.
    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.title.clone())
    }
}
