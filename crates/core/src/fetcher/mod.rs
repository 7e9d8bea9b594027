//! Fetcher module for retrieving media from source URLs.
//!
//! The fetcher hands a URL and an opaque quality selector to an external
//! extractor and returns the single file it wrote into the working directory.
//! Playlists are rejected; only single items are downloaded.

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use traits::Fetcher;
pub use types::{DownloadRequest, FetchResult, DEFAULT_QUALITY};
pub use ytdlp::YtDlpFetcher;
