// Standalone worker process: drains the generation queue without serving HTTP.
//
// Run alongside one or more API server instances when generation load should
// be isolated from request handling.

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::config::Config;
use server_core::domains::articles::{ArticleStore, RedisArticleStore};
use server_core::kernel::generation::{
    AnthropicTextGenerator, ClientManager, Pipeline, PipelineConfig, SystemClock, TextGenerator,
};
use server_core::kernel::jobs::{connect_redis, JobStore, RedisJobStore, Worker, WorkerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting article generation worker");

    let config = Config::from_env().context("Failed to load configuration")?;

    let redis = connect_redis(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    tracing::info!("Redis connected");

    let jobs: Arc<dyn JobStore> = Arc::new(RedisJobStore::from_connection(redis.clone()));
    let articles: Arc<dyn ArticleStore> = Arc::new(RedisArticleStore::from_connection(redis));

    let client_manager =
        ClientManager::new(config.anthropic_api_key.clone(), Arc::new(SystemClock));
    let generator: Arc<dyn TextGenerator> = Arc::new(AnthropicTextGenerator::new(
        client_manager,
        config.generation.model.clone(),
    ));
    let pipeline = Arc::new(Pipeline::new(
        generator,
        articles,
        jobs.clone(),
        PipelineConfig::from(&config.generation),
    ));

    let worker = Worker::with_config(
        jobs,
        pipeline,
        WorkerConfig {
            poll_interval: config.worker_poll_interval,
            ..Default::default()
        },
    );

    worker.run_until_shutdown().await
}
