//! Configuration for the uploader module.

use serde::{Deserialize, Serialize};

use super::CHUNK_GRANULARITY;

/// Configuration for the Drive uploader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Base URL of the Drive API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Size of each resumable chunk in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Compare the local MD5 with the checksum Drive reports.
    #[serde(default = "default_true")]
    pub verify_checksum: bool,
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_chunk_size() -> usize {
    32 * CHUNK_GRANULARITY // 8 MB
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            chunk_size_bytes: default_chunk_size(),
            timeout_secs: default_timeout_secs(),
            verify_checksum: true,
        }
    }
}

impl UploaderConfig {
    /// Points the uploader at a different API host.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the chunk size.
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size_bytes = bytes;
        self
    }

    /// Enables or disables checksum verification.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }
}
