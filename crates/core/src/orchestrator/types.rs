//! Types for the job orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::credentials::AuthError;
use crate::fetcher::{DownloadRequest, FetchError};
use crate::uploader::UploadError;

/// Position of a job in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Received,
    Fetching,
    Uploading,
    CleaningUp,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Fetching => "fetching",
            Self::Uploading => "uploading",
            Self::CleaningUp => "cleaning_up",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Extraction,
    Auth,
    Upload,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::Auth => "auth",
            Self::Upload => "upload",
        }
    }
}

/// Why a job failed. Cleanup problems are never a `JobError`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Extraction(#[from] FetchError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl JobError {
    pub fn stage(&self) -> JobStage {
        match self {
            Self::Extraction(_) => JobStage::Extraction,
            Self::Auth(_) => JobStage::Auth,
            Self::Upload(_) => JobStage::Upload,
        }
    }

    /// Whether the caller's input caused the failure.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::Extraction(e) if e.is_request_error())
    }
}

/// Terminal result of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum JobOutcome {
    Success {
        title: String,
        file_name: String,
        remote_object_id: String,
    },
    Failure {
        stage: JobStage,
        message: String,
        /// Set when the request itself was invalid (bad URL, playlist).
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        bad_request: bool,
    },
}

impl From<&JobError> for JobOutcome {
    fn from(err: &JobError) -> Self {
        Self::Failure {
            stage: err.stage(),
            message: err.to_string(),
            bad_request: err.is_bad_request(),
        }
    }
}

/// What a finished job reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub request: DownloadRequest,
    pub outcome: JobOutcome,
    pub duration_ms: u64,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Success { .. })
    }

    pub fn final_state(&self) -> JobState {
        if self.is_success() {
            JobState::Completed
        } else {
            JobState::Failed
        }
    }

    /// Remote object id, present only on success.
    pub fn remote_object_id(&self) -> Option<&str> {
        match &self.outcome {
            JobOutcome::Success {
                remote_object_id, ..
            } => Some(remote_object_id),
            JobOutcome::Failure { .. } => None,
        }
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Jobs between Received and a terminal state.
    pub active_jobs: usize,
    /// Jobs waiting for a concurrency slot.
    pub queued_jobs: usize,
    /// Completed jobs since startup.
    pub completed_jobs: u64,
    /// Failed jobs since startup.
    pub failed_jobs: u64,
    /// Concurrency limit (0 = unlimited).
    pub max_concurrent_jobs: usize,
}
