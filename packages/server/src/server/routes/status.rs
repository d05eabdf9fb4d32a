//! Job status polling endpoint.
//!
//! GET /api/status/:id
//!
//! Returns the job's state as of the moment of the call - no server-side
//! blocking or long-poll; callers poll repeatedly.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::kernel::jobs::JobStore;
use crate::server::app::AppState;

use super::generate::ApiErrorResponse;

/// Status handler: `200 {id, status, progress, result?, error?}` or `404`.
pub async fn status_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.jobs.get(&id).await {
        Ok(Some(job)) => (StatusCode::OK, Json(job.status_view())).into_response(),
        Ok(None) => {
            warn!(job_id = %id, "job not found");
            (
                StatusCode::NOT_FOUND,
                Json(ApiErrorResponse::new("Job not found")),
            )
                .into_response()
        }
        Err(e) => {
            error!(job_id = %id, error = %e, "failed to fetch job status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("Internal server error")),
            )
                .into_response()
        }
    }
}

/// `GET /api/status` with no id is a client error, not a 404.
pub async fn status_without_id_handler() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new("Job ID is required")),
    )
        .into_response()
}
