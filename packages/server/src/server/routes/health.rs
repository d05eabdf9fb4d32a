use axum::{extract::Extension, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::kernel::jobs::JobStore;
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    redis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue: Option<QueueDepths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct QueueDepths {
    waiting: usize,
    completed: usize,
    failed: usize,
}

/// Health check endpoint
///
/// Checks:
/// - Job store backend connectivity (Redis ping)
/// - Queue depths (pending/completed/failed list lengths)
///
/// Returns 200 OK if the backend responds, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let ping = tokio::time::timeout(std::time::Duration::from_secs(5), state.jobs.ping()).await;

    let backend_error = match ping {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(format!("Ping failed: {e}")),
        Err(_) => Some("Ping timeout (>5s)".to_string()),
    };

    if let Some(error) = backend_error {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy".to_string(),
                redis: "disconnected".to_string(),
                queue: None,
                error: Some(error),
                timestamp: Utc::now(),
            }),
        );
    }

    // Depth counters are informational; a failure here still reports healthy
    let queue = match (
        state.jobs.pending_count().await,
        state.jobs.completed_count().await,
        state.jobs.failed_count().await,
    ) {
        (Ok(waiting), Ok(completed), Ok(failed)) => Some(QueueDepths {
            waiting,
            completed,
            failed,
        }),
        _ => None,
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            redis: "connected".to_string(),
            queue,
            error: None,
            timestamp: Utc::now(),
        }),
    )
}
