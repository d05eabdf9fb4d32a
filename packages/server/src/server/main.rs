// Main entry point for the article generation API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::config::Config;
use server_core::domains::articles::{ArticleStore, RedisArticleStore};
use server_core::kernel::generation::{
    AnthropicTextGenerator, ClientManager, Pipeline, PipelineConfig, SystemClock, TextGenerator,
};
use server_core::kernel::jobs::{connect_redis, JobStore, RedisJobStore, Worker, WorkerConfig};
use server_core::server::{build_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Article Generation API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to Redis (shared connection manager)
    tracing::info!("Connecting to Redis...");
    let redis = connect_redis(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    tracing::info!("Redis connected");

    let jobs: Arc<dyn JobStore> = Arc::new(RedisJobStore::from_connection(redis.clone()));
    let articles: Arc<dyn ArticleStore> = Arc::new(RedisArticleStore::from_connection(redis));

    // Generation dependencies
    let client_manager =
        ClientManager::new(config.anthropic_api_key.clone(), Arc::new(SystemClock));
    let generator: Arc<dyn TextGenerator> = Arc::new(AnthropicTextGenerator::new(
        client_manager,
        config.generation.model.clone(),
    ));
    let pipeline = Arc::new(Pipeline::new(
        generator,
        articles.clone(),
        jobs.clone(),
        PipelineConfig::from(&config.generation),
    ));

    // Spawn the worker loop as a background task
    let worker = Worker::with_config(
        jobs.clone(),
        pipeline,
        WorkerConfig {
            poll_interval: config.worker_poll_interval,
            ..Default::default()
        },
    );
    tokio::spawn(async move {
        if let Err(e) = worker.run().await {
            tracing::error!(error = %e, "worker exited with error");
        }
    });

    // Build application
    let app = build_app(AppState { jobs, articles });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
