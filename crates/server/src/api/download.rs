//! The `/download` endpoint.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use drivedrop_core::{InvocationMode, JobOutcome, JobReport, JobStage, ResponseFormat};

use crate::state::AppState;

const BACKGROUND_MESSAGE: &str =
    "The download has started in the background. Check your Drive in a few minutes.";

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub quality: Option<String>,
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let orchestrator = state.orchestrator();
    let format = orchestrator.config().response_format;

    let url = query.url.trim();
    if url.is_empty() {
        return render(
            format,
            StatusCode::BAD_REQUEST,
            json!({
                "error": "missing required query parameter: url",
                "stage": "request",
            }),
        );
    }

    let request = orchestrator.request(url, query.quality);
    let source_url = request.source_url.clone();
    let quality = request.quality.clone();

    // Jobs run on their own task so a dropped connection cannot skip cleanup
    let handle = orchestrator.submit(request);

    match orchestrator.config().mode {
        InvocationMode::Background => {
            info!("Accepted job {} for {}", handle.job_id, source_url);
            render(
                format,
                StatusCode::ACCEPTED,
                json!({
                    "status": "processing",
                    "message": BACKGROUND_MESSAGE,
                    "details": {
                        "job_id": handle.job_id,
                        "url": source_url,
                        "quality": quality,
                    },
                }),
            )
        }
        InvocationMode::Synchronous => match handle.result.await {
            Ok(report) => {
                let (status, body) = report_body(&report);
                render(format, status, body)
            }
            Err(_) => {
                error!("Job {} ended without reporting", handle.job_id);
                render(
                    format,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "job ended without a result",
                        "stage": "internal",
                    }),
                )
            }
        },
    }
}

/// Status and payload for a finished job.
pub fn report_body(report: &JobReport) -> (StatusCode, Value) {
    match &report.outcome {
        JobOutcome::Success {
            title,
            file_name,
            remote_object_id,
        } => (
            StatusCode::OK,
            json!({
                "title": title,
                "url": report.request.source_url,
                "filename": file_name,
                "quality": report.request.quality,
                "drive_file_id": remote_object_id,
            }),
        ),
        JobOutcome::Failure {
            stage,
            message,
            bad_request,
        } => (
            failure_status(*stage, *bad_request),
            json!({
                "error": message,
                "stage": stage.as_str(),
            }),
        ),
    }
}

fn failure_status(stage: JobStage, bad_request: bool) -> StatusCode {
    match stage {
        JobStage::Extraction if bad_request => StatusCode::BAD_REQUEST,
        JobStage::Extraction => StatusCode::UNPROCESSABLE_ENTITY,
        JobStage::Auth => StatusCode::INTERNAL_SERVER_ERROR,
        JobStage::Upload => StatusCode::BAD_GATEWAY,
    }
}

fn render(format: ResponseFormat, status: StatusCode, body: Value) -> Response {
    match format {
        ResponseFormat::Json => (status, Json(body)).into_response(),
        ResponseFormat::Javascript => (
            status,
            [(header::CONTENT_TYPE, "application/javascript")],
            es_module(&body),
        )
            .into_response(),
    }
}

/// Render a payload as an ES module whose default export is the payload.
pub fn es_module(body: &Value) -> String {
    // JSON allows raw line separators inside strings, older JS parsers do not
    let literal = body
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029");
    format!("export default {};\n", literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivedrop_core::DownloadRequest;

    fn report(outcome: JobOutcome) -> JobReport {
        JobReport {
            job_id: "job-1".to_string(),
            request: DownloadRequest::new("https://example.com/video1", "best"),
            outcome,
            duration_ms: 12,
        }
    }

    #[test]
    fn test_success_body() {
        let (status, body) = report_body(&report(JobOutcome::Success {
            title: "clip".to_string(),
            file_name: "clip.mp4".to_string(),
            remote_object_id: "abc123".to_string(),
        }));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "title": "clip",
                "url": "https://example.com/video1",
                "filename": "clip.mp4",
                "quality": "best",
                "drive_file_id": "abc123",
            })
        );
    }

    #[test]
    fn test_failure_status_mapping() {
        let failure = |stage, bad_request| {
            report_body(&report(JobOutcome::Failure {
                stage,
                message: "boom".to_string(),
                bad_request,
            }))
            .0
        };
        assert_eq!(failure(JobStage::Extraction, true), StatusCode::BAD_REQUEST);
        assert_eq!(
            failure(JobStage::Extraction, false),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            failure(JobStage::Auth, false),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(failure(JobStage::Upload, false), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_es_module() {
        let rendered = es_module(&json!({"title": "a\u{2028}b"}));
        assert_eq!(rendered, "export default {\"title\":\"a\\u2028b\"};\n");
    }
}
