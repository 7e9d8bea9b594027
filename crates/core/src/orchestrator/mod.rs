//! Job orchestrator for download-then-upload requests.
//!
//! Each request runs once through a fixed state machine:
//! `Received -> Fetching -> Uploading -> CleaningUp -> Completed | Failed`.
//! The local file is always removed after an upload attempt, whatever its
//! result. Jobs hold no state beyond their own task and are never persisted.

mod config;
mod runner;
mod types;

pub use config::{InvocationMode, OrchestratorConfig, ResponseFormat};
pub use runner::{JobHandle, JobOrchestrator, JobUpdateCallback};
pub use types::{JobError, JobOutcome, JobReport, JobStage, JobState, OrchestratorStatus};
