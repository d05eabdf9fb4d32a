//! Article generation submission endpoint.
//!
//! POST /api/articles/generate
//!
//! Validates the request shape, creates the article placeholder and the job
//! under a shared id, enqueues the job and returns immediately - generation
//! happens in the worker, the caller polls `/api/status/:id`.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domains::articles::ArticleStore;
use crate::kernel::jobs::{GenerationRequest, JobStatus, JobStore};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateArticleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub outline: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: String,
}

#[derive(Serialize)]
pub struct GenerateArticleResponse {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

fn validate(request: &GenerateArticleRequest) -> Vec<String> {
    let mut details = Vec::new();
    if request.title.trim().is_empty() {
        details.push("title is required".to_string());
    }
    if !request
        .keywords
        .iter()
        .any(|keyword| !keyword.trim().is_empty())
    {
        details.push("at least one keyword is required".to_string());
    }
    if request.category.trim().is_empty() {
        details.push("category is required".to_string());
    }
    details
}

/// Submission handler.
///
/// `200 {jobId, status}` on success, `400 {error, details}` on a malformed
/// request, `500 {error}` when the store is unreachable.
pub async fn generate_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<GenerateArticleRequest>,
) -> Response {
    let details = validate(&body);
    if !details.is_empty() {
        warn!(?details, "generation request failed validation");
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse {
                error: "Invalid input data".to_string(),
                details: Some(details),
            }),
        )
            .into_response();
    }

    let request = GenerationRequest {
        title: body.title,
        outline: body.outline,
        keywords: body.keywords,
        category: body.category,
    };
    let job_id = Uuid::new_v4().to_string();

    info!(job_id = %job_id, title = %request.title, "generation request received");

    if let Err(e) = state.articles.create_pending(&job_id, &request).await {
        error!(job_id = %job_id, error = %e, "failed to create article placeholder");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("Failed to create article entry")),
        )
            .into_response();
    }

    match state.jobs.create_with_id(&job_id, request).await {
        Ok(job) => {
            info!(job_id = %job.id, "generation job enqueued");
            (
                StatusCode::OK,
                Json(GenerateArticleResponse {
                    job_id: job.id,
                    status: job.status,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(job_id = %job_id, error = %e, "failed to enqueue generation job");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("Internal server error")),
            )
                .into_response()
        }
    }
}
