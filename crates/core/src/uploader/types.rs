//! Types for the uploader module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file to upload.
#[derive(Debug, Clone)]
pub struct UploadJob {
    /// Local file to read.
    pub local_path: PathBuf,
    /// Destination folder id.
    pub folder_id: String,
    /// Name of the remote object.
    pub file_name: String,
    /// Content type sent with the upload.
    pub mime_type: String,
}

impl UploadJob {
    /// Builds a job named after the local file, guessing the MIME type from
    /// its extension.
    pub fn for_file(local_path: impl Into<PathBuf>, folder_id: impl Into<String>) -> Self {
        let local_path = local_path.into();
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = guess_mime_type(&local_path).to_string();

        Self {
            local_path,
            folder_id: folder_id.into(),
            file_name,
            mime_type,
        }
    }

    /// Overrides the remote name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }
}

/// A committed remote object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Storage-assigned identifier.
    pub remote_object_id: String,
    /// Remote name.
    pub file_name: String,
    /// Bytes sent.
    pub size_bytes: u64,
    /// MD5 reported by storage, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_checksum: Option<String>,
}

/// Progress update after each committed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Fraction committed, in `[0, 1]`. Empty files count as done.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_sent.min(self.total_bytes) as f64) / (self.total_bytes as f64)
    }
}

/// MIME type for common media extensions.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "flv" => "video/x-flv",
        "3gp" => "video/3gpp",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "opus" | "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "vtt" => "text/vtt",
        "srt" => "application/x-subrip",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
