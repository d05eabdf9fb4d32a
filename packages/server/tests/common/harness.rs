//! In-process test harness.
//!
//! Wires in-memory stores and a scripted generator the same way the
//! binaries wire the Redis-backed pieces, so suites exercise the exact
//! production pipeline/worker/router code without external services.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use server_core::domains::articles::{ArticleStore, InMemoryArticleStore};
use server_core::kernel::generation::{Pipeline, PipelineConfig, TextGenerator};
use server_core::kernel::jobs::{GenerationRequest, InMemoryJobStore, Job, JobStore};
use server_core::server::{build_app, AppState};

pub struct TestHarness {
    pub jobs: Arc<InMemoryJobStore>,
    pub articles: Arc<InMemoryArticleStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(InMemoryJobStore::new()),
            articles: Arc::new(InMemoryArticleStore::new()),
        }
    }

    /// Pipeline config with test-sized delays: generous deadline, instant
    /// retries.
    pub fn fast_config() -> PipelineConfig {
        PipelineConfig {
            timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_delay: Duration::from_millis(10),
            max_tokens: 2_000,
        }
    }

    pub fn pipeline(&self, generator: Arc<dyn TextGenerator>) -> Arc<Pipeline> {
        self.pipeline_with_config(generator, Self::fast_config())
    }

    pub fn pipeline_with_config(
        &self,
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
    ) -> Arc<Pipeline> {
        let jobs: Arc<dyn JobStore> = self.jobs.clone();
        let articles: Arc<dyn ArticleStore> = self.articles.clone();
        Arc::new(Pipeline::new(generator, articles, jobs, config))
    }

    /// Router over the harness stores, as served by the API binary.
    pub fn app(&self) -> Router {
        let jobs: Arc<dyn JobStore> = self.jobs.clone();
        let articles: Arc<dyn ArticleStore> = self.articles.clone();
        build_app(AppState { jobs, articles })
    }

    /// Create the article placeholder and job the way the submission
    /// endpoint does, sharing one id.
    pub async fn submit(&self, request: GenerationRequest) -> Job {
        let id = uuid::Uuid::new_v4().to_string();
        self.articles
            .create_pending(&id, &request)
            .await
            .expect("article placeholder");
        self.jobs
            .create_with_id(&id, request)
            .await
            .expect("job record")
    }
}
