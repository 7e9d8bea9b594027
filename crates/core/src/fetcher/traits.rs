//! Trait definitions for the fetcher module.

use async_trait::async_trait;

use super::error::FetchError;
use super::types::{DownloadRequest, FetchResult};

/// Retrieves media from a source URL into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Downloads a single item. On success exactly one file exists at
    /// `FetchResult::local_path`. On failure nothing the attempt wrote is
    /// left in the working directory.
    async fn fetch(&self, request: &DownloadRequest) -> Result<FetchResult, FetchError>;

    /// Validates that the fetcher is properly configured and ready.
    async fn validate(&self) -> Result<(), FetchError>;
}
