//! Uploader module for pushing local files to remote storage.
//!
//! The Drive implementation uses the resumable upload protocol: one session
//! is opened per file and chunks are committed sequentially. An object id is
//! only returned once every chunk has been accepted.

mod config;
mod drive;
mod error;
mod traits;
mod types;

pub use config::UploaderConfig;
pub use drive::DriveUploader;
pub use error::UploadError;
pub use traits::Uploader;
pub use types::{guess_mime_type, UploadJob, UploadProgress, UploadResult};

/// Resumable chunks other than the last must be a multiple of this size.
pub const CHUNK_GRANULARITY: usize = 256 * 1024;
