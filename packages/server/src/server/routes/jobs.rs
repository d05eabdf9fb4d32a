//! Internal job update endpoint.
//!
//! PATCH /api/jobs/:id
//!
//! Merges a partial `{status?, progress?, result?, error?}` onto the job
//! record. Used by pipeline/worker components running out of process;
//! unspecified fields keep their stored values.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::kernel::jobs::{JobResult, JobStatus, JobStore};
use crate::server::app::AppState;

use super::generate::ApiErrorResponse;

#[derive(Debug, Deserialize)]
pub struct JobUpdateRequest {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
}

/// Merge handler: `200 {status: "success"}`, `404` for unknown ids.
pub async fn update_job_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(body): Json<JobUpdateRequest>,
) -> Response {
    let current = match state.jobs.get(&id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            warn!(job_id = %id, "job not found for update");
            return (
                StatusCode::NOT_FOUND,
                Json(ApiErrorResponse::new("Job not found")),
            )
                .into_response();
        }
        Err(e) => {
            error!(job_id = %id, error = %e, "failed to load job for update");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("Failed to update job status")),
            )
                .into_response();
        }
    };

    let status = body.status.unwrap_or(current.status);
    let progress = body.progress.unwrap_or(current.progress);

    match state
        .jobs
        .update_status(&id, status, progress, body.result, body.error)
        .await
    {
        Ok(Some(updated)) => {
            info!(
                job_id = %id,
                status = updated.status.as_str(),
                progress = updated.progress,
                has_result = updated.result.is_some(),
                "job updated"
            );
            (StatusCode::OK, Json(json!({ "status": "success" }))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiErrorResponse::new("Job not found")),
        )
            .into_response(),
        Err(e) => {
            error!(job_id = %id, error = %e, "failed to update job");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("Failed to update job status")),
            )
                .into_response()
        }
    }
}
