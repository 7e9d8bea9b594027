//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use crate::fetcher::DEFAULT_QUALITY;

/// Whether the HTTP caller waits for the job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    /// Acknowledge immediately and run the job in the background.
    #[default]
    Background,
    /// Hold the request open until the job reaches a terminal state.
    Synchronous,
}

/// How responses are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Json,
    /// The JSON payload wrapped as an ES module default export.
    Javascript,
}

/// Configuration for the job orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub mode: InvocationMode,

    #[serde(default)]
    pub response_format: ResponseFormat,

    /// Quality selector used when a request omits one.
    #[serde(default = "default_quality")]
    pub default_quality: String,

    /// Maximum jobs running at once (0 = unlimited).
    /// Jobs over the limit wait for a free slot.
    #[serde(default)]
    pub max_concurrent_jobs: usize,
}

fn default_quality() -> String {
    DEFAULT_QUALITY.to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mode: InvocationMode::default(),
            response_format: ResponseFormat::default(),
            default_quality: default_quality(),
            max_concurrent_jobs: 0,
        }
    }
}
