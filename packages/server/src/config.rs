use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Model used when `GENERATION_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub generation: GenerationConfig,
    /// Worker idle sleep between pending-queue polls
    pub worker_poll_interval: Duration,
    /// Client-side status polling interval
    pub status_poll_interval: Duration,
    /// Client-side status polling attempt cap
    pub status_poll_max_attempts: u32,
}

/// Tunables for the generation pipeline
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: String,
    /// Overall wall-clock deadline per job
    pub timeout: Duration,
    /// Attempt cap per generation step
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
    /// Output bound per generation call
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_millis(290_000),
            max_retries: 3,
            retry_delay: Duration::from_millis(5_000),
            max_tokens: 2_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .context("ANTHROPIC_API_KEY must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            generation: GenerationConfig {
                model: env::var("GENERATION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
                timeout: duration_ms_var("GENERATION_TIMEOUT_MS", 290_000)?,
                max_retries: u32_var("GENERATION_MAX_RETRIES", 3)?,
                retry_delay: duration_ms_var("GENERATION_RETRY_DELAY_MS", 5_000)?,
                max_tokens: u32_var("GENERATION_MAX_TOKENS", 2_000)?,
            },
            worker_poll_interval: duration_ms_var("WORKER_POLL_INTERVAL_MS", 1_000)?,
            status_poll_interval: duration_ms_var("STATUS_POLL_INTERVAL_MS", 5_000)?,
            status_poll_max_attempts: u32_var("STATUS_POLL_MAX_ATTEMPTS", 60)?,
        })
    }
}

fn duration_ms_var(name: &str, default: u64) -> Result<Duration> {
    let ms = match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a number of milliseconds"))?,
        Err(_) => default,
    };
    Ok(Duration::from_millis(ms))
}

fn u32_var(name: &str, default: u32) -> Result<u32> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a number")),
        Err(_) => Ok(default),
    }
}
