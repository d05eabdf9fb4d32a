//! Worker service that drains the pending job queue.
//!
//! The `Worker` is a long-running service that:
//! - Polls the pending list on a fixed interval when idle
//! - Runs the generation pipeline for each pending job, sequentially
//! - Never lets one job's failure stop the loop
//! - Verifies the pipeline's terminal write as a double-failure safety net
//!
//! # Architecture
//!
//! ```text
//! Worker
//!     │
//!     ├─► Poll pending list (store.list_pending)
//!     ├─► Pipeline.run(job)
//!     │       └─► progress + terminal writes happen inside the pipeline
//!     └─► On pipeline error: force a terminal write if one is missing
//! ```
//!
//! # Example
//!
//! ```ignore
//! let worker = Worker::new(store, pipeline);
//!
//! // Spawn as background task
//! tokio::spawn(worker.run());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::kernel::generation::{GenerationError, Pipeline};

use super::job::JobStatus;
use super::store::JobStore;

/// Configuration for the worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How long to wait between polls when no jobs are pending
    pub poll_interval: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl WorkerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// Background service that processes generation jobs from the queue.
///
/// The worker polls for pending jobs and runs the pipeline for each one.
/// Terminal status writes are the pipeline's responsibility; the worker only
/// verifies they happened.
pub struct Worker {
    store: Arc<dyn JobStore>,
    pipeline: Arc<Pipeline>,
    config: WorkerConfig,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    /// Create a new worker.
    pub fn new(store: Arc<dyn JobStore>, pipeline: Arc<Pipeline>) -> Self {
        Self::with_config(store, pipeline, WorkerConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(
        store: Arc<dyn JobStore>,
        pipeline: Arc<Pipeline>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            pipeline,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a shutdown handle for graceful shutdown.
    ///
    /// Call `store(true, Ordering::SeqCst)` on the returned Arc to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Request shutdown of the worker.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run the worker until shutdown is requested.
    ///
    /// This is the main loop that polls for jobs and executes them.
    /// Call `request_shutdown()` to stop the worker gracefully.
    pub async fn run(self) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "worker starting"
        );

        loop {
            if self.is_shutdown_requested() {
                break;
            }

            let jobs = match self.store.list_pending().await {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(error = %e, "failed to poll pending jobs");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            if jobs.is_empty() {
                // No jobs available, sleep until next poll
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            debug!(count = jobs.len(), "picked up pending jobs");

            // Process jobs sequentially; one failure never stops the loop
            for job in jobs {
                if self.is_shutdown_requested() {
                    break;
                }

                let job_id = job.id.clone();
                debug!(job_id = %job_id, "processing job");

                match self.pipeline.run(&job).await {
                    Ok(result) => {
                        info!(
                            job_id = %job_id,
                            content_len = result.content.len(),
                            "job completed"
                        );
                    }
                    Err(generation_error) => {
                        warn!(job_id = %job_id, error = %generation_error, "job failed");
                        self.ensure_terminal_write(&job_id, &generation_error).await;
                    }
                }
            }
        }

        info!(worker_id = %self.config.worker_id, "worker stopped");
        Ok(())
    }

    /// Run until a shutdown signal is received.
    ///
    /// Convenience method that listens for Ctrl+C.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = self.shutdown_handle();

        // Spawn signal handler
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
            shutdown.store(true, Ordering::SeqCst);
        });

        self.run().await
    }

    /// Double-failure safety net.
    ///
    /// The pipeline writes its own terminal status before surfacing an
    /// error; if that write did not land, force one here so no job stays
    /// stuck in a running state.
    async fn ensure_terminal_write(&self, job_id: &str, generation_error: &GenerationError) {
        match self.store.get(job_id).await {
            Ok(Some(job)) if job.status.is_terminal() => {
                warn!(
                    job_id = %job_id,
                    status = job.status.as_str(),
                    "pipeline surfaced an error after its terminal status write"
                );
            }
            Ok(Some(_)) => {
                warn!(job_id = %job_id, "pipeline left no terminal status, forcing one");
                match self
                    .store
                    .update_status(
                        job_id,
                        JobStatus::Failed,
                        0,
                        None,
                        Some(generation_error.user_message()),
                    )
                    .await
                {
                    Ok(_) => {}
                    Err(e) => {
                        error!(job_id = %job_id, error = %e, "failed to force terminal status")
                    }
                }
            }
            Ok(None) => warn!(job_id = %job_id, "job disappeared before its terminal write"),
            Err(e) => error!(job_id = %job_id, error = %e, "failed to verify terminal status"),
        }
    }
}
