//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the drivedrop server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Job state transitions and outcomes
//! - Orchestrator load (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

use drivedrop_core::JobState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "drivedrop_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        // Synchronous downloads hold the request for the whole job
        .buckets(vec![
            0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("drivedrop_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "drivedrop_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Job state transitions.
pub static JOB_STATE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "drivedrop_job_state_transitions_total",
            "Job state transitions by target state",
        ),
        &["state"],
    )
    .unwrap()
});

/// Finished jobs by outcome.
pub static JOBS_FINISHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("drivedrop_jobs_finished_total", "Jobs that reached a terminal state"),
        &["outcome"],
    )
    .unwrap()
});

/// Jobs currently running (collected dynamically).
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("drivedrop_jobs_active", "Number of jobs currently running").unwrap()
});

/// Jobs waiting for a concurrency slot (collected dynamically).
pub static JOBS_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "drivedrop_jobs_queued",
        "Number of jobs waiting for a free slot",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Jobs
    registry
        .register(Box::new(JOB_STATE_TRANSITIONS.clone()))
        .unwrap();
    registry
        .register(Box::new(JOBS_FINISHED_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();
    registry.register(Box::new(JOBS_QUEUED.clone())).unwrap();
}

/// Record a job state transition. Used as the orchestrator update callback.
pub fn record_job_transition(state: JobState) {
    JOB_STATE_TRANSITIONS
        .with_label_values(&[state.as_str()])
        .inc();
    if state.is_terminal() {
        JOBS_FINISHED_TOTAL
            .with_label_values(&[state.as_str()])
            .inc();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the orchestrator right now.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status();
    JOBS_ACTIVE.set(status.active_jobs as i64);
    JOBS_QUEUED.set(status.queued_jobs as i64);
}
