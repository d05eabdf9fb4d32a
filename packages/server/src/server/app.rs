//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::articles::ArticleStore;
use crate::kernel::jobs::JobStore;
use crate::server::routes::{
    generate_handler, health_handler, status_handler, status_without_id_handler,
    update_job_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<dyn JobStore>,
    pub articles: Arc<dyn ArticleStore>,
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    // CORS configuration - the admin UI runs on a separate origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/articles/generate", post(generate_handler))
        .route("/api/status", get(status_without_id_handler))
        .route("/api/status/:id", get(status_handler))
        .route("/api/jobs/:id", patch(update_job_handler))
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
