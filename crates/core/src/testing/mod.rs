//! Testing utilities and mock implementations.
//!
//! Mocks for every external seam of a job, so the orchestrator and the HTTP
//! layer can be exercised without yt-dlp or Google credentials.
//!
//! # Example
//!
//! ```rust,ignore
//! use drivedrop_core::testing::{MockCredentialProvider, MockFetcher, MockUploader};
//!
//! let fetcher = MockFetcher::new(temp.path());
//! let uploader = MockUploader::new();
//! uploader.set_remote_id("abc123").await;
//!
//! // Use in JobOrchestrator...
//! ```

mod mock_credentials;
mod mock_fetcher;
mod mock_uploader;

pub use mock_credentials::MockCredentialProvider;
pub use mock_fetcher::MockFetcher;
pub use mock_uploader::{MockUploader, RecordedUpload};
