//! Job storage and queue lists.
//!
//! Jobs are persisted as hashes keyed `job:<id>`; three lists index the
//! queue state: `job:queue` (pending), `job:completed` and `job:failed`.
//! Status updates only touch the fields they change, so concurrent writers
//! updating disjoint fields never clobber each other.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::{debug, warn};

use super::job::{GenerationRequest, Job, JobResult, JobStatus};

/// Pending job ids, newest first.
pub const PENDING_LIST: &str = "job:queue";
/// Ids of jobs that reached `completed`.
pub const COMPLETED_LIST: &str = "job:completed";
/// Ids of jobs that reached `failed`.
pub const FAILED_LIST: &str = "job:failed";

/// Errors from the job store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the backend.
    #[error("Redis connection failed: {0}")]
    ConnectionFailed(String),

    /// Backend operation failed.
    #[error("Redis operation failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// Failed to serialize a job payload.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage contract for job records and their queue lists.
///
/// Both the submission surface and the worker go through this trait; it is
/// the only shared mutable resource in the subsystem.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Allocate a fresh id, persist the record and append it to the pending
    /// list.
    async fn create(&self, request: GenerationRequest) -> Result<Job, StoreError>;

    /// Like [`JobStore::create`] with a caller-supplied id, so the job can
    /// share its id with the article placeholder.
    async fn create_with_id(&self, id: &str, request: GenerationRequest)
        -> Result<Job, StoreError>;

    /// Full record, or `None` for an unknown id.
    async fn get(&self, id: &str) -> Result<Option<Job>, StoreError>;

    /// Merge a status update onto the existing record.
    ///
    /// Unset `result`/`error` keep the previous values; a terminal failure
    /// clears any stale result and a completion clears any previous error.
    /// A transition to `Completed`/`Failed` moves the id from the pending
    /// list to the matching terminal list exactly once - repeating a
    /// terminal write changes nothing, and a write that would leave a
    /// terminal state is ignored. Returns `None` if the job no longer
    /// exists.
    async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        progress: u8,
        result: Option<JobResult>,
        error: Option<String>,
    ) -> Result<Option<Job>, StoreError>;

    /// Snapshot of the pending list bodies, oldest first.
    async fn list_pending(&self) -> Result<Vec<Job>, StoreError>;

    /// Purge a job body and all of its list entries. Idempotent.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;

    async fn pending_count(&self) -> Result<usize, StoreError>;
    async fn completed_count(&self) -> Result<usize, StoreError>;
    async fn failed_count(&self) -> Result<usize, StoreError>;

    /// Backend liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Connect a shared connection manager (handles reconnection automatically).
pub async fn connect_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let client = redis::Client::open(redis_url)
        .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
    ConnectionManager::new(client)
        .await
        .map_err(|e| StoreError::ConnectionFailed(e.to_string()))
}

// ============================================================================
// Update planning (shared by both backends)
// ============================================================================

struct UpdatePlan {
    merged: Job,
    /// Move the id from the pending list to a terminal list
    terminal_move: bool,
    /// Update refused: the job is already in a different terminal state
    ignored: bool,
}

fn plan_update(
    current: &Job,
    status: JobStatus,
    progress: u8,
    result: Option<JobResult>,
    error: Option<String>,
) -> UpdatePlan {
    if current.status.is_terminal() && status != current.status {
        return UpdatePlan {
            merged: current.clone(),
            terminal_move: false,
            ignored: true,
        };
    }

    let result = match status {
        // A terminal failure never keeps a stale result around
        JobStatus::Failed => None,
        _ => result.or_else(|| current.result.clone()),
    };
    let error = match status {
        JobStatus::Completed => None,
        _ => error.or_else(|| current.error.clone()),
    };

    let terminal_move = status.is_terminal() && current.status != status;
    let merged = Job {
        status,
        progress,
        result,
        error,
        ..current.clone()
    };

    UpdatePlan {
        merged,
        terminal_move,
        ignored: false,
    }
}

fn terminal_list(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Completed => COMPLETED_LIST,
        _ => FAILED_LIST,
    }
}

// ============================================================================
// Redis backend
// ============================================================================

/// Redis-backed job store.
pub struct RedisJobStore {
    redis: ConnectionManager,
}

impl RedisJobStore {
    /// Connect to Redis and create a store.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            redis: connect_redis(redis_url).await?,
        })
    }

    /// Create from an existing connection manager.
    ///
    /// Useful when sharing a connection across multiple components.
    pub fn from_connection(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn job_key(id: &str) -> String {
        format!("job:{id}")
    }

    fn to_fields(job: &Job) -> Result<Vec<(&'static str, String)>, StoreError> {
        let mut fields = vec![
            ("id", job.id.clone()),
            ("name", job.name.clone()),
            ("data", serde_json::to_string(&job.data)?),
            ("status", job.status.as_str().to_string()),
            ("createdAt", job.created_at.to_rfc3339()),
            ("progress", job.progress.to_string()),
        ];
        if let Some(result) = &job.result {
            fields.push(("result", serde_json::to_string(result)?));
        }
        if let Some(error) = &job.error {
            fields.push(("error", error.clone()));
        }
        Ok(fields)
    }

    fn from_fields(map: HashMap<String, String>) -> Option<Job> {
        let id = map.get("id")?.clone();
        let data = serde_json::from_str(map.get("data")?).ok()?;
        let status = JobStatus::parse(map.get("status")?)?;
        let created_at = DateTime::parse_from_rfc3339(map.get("createdAt")?)
            .ok()?
            .with_timezone(&Utc);
        Some(Job {
            id,
            name: map
                .get("name")
                .cloned()
                .unwrap_or_else(|| "generate".to_string()),
            data,
            status,
            created_at,
            progress: map.get("progress").and_then(|p| p.parse().ok()).unwrap_or(0),
            result: map.get("result").and_then(|raw| serde_json::from_str(raw).ok()),
            error: map.get("error").cloned(),
        })
    }

    async fn fetch(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let mut conn = self.redis.clone();
        let map: HashMap<String, String> = conn.hgetall(Self::job_key(id)).await?;
        if map.is_empty() {
            return Ok(None);
        }
        match Self::from_fields(map) {
            Some(job) => Ok(Some(job)),
            None => {
                warn!(job_id = %id, "job record is corrupt, treating as missing");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn create(&self, request: GenerationRequest) -> Result<Job, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.create_with_id(&id, request).await
    }

    async fn create_with_id(
        &self,
        id: &str,
        request: GenerationRequest,
    ) -> Result<Job, StoreError> {
        let job = Job::with_id(id, request);
        let fields = Self::to_fields(&job)?;

        let mut conn = self.redis.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(Self::job_key(&job.id), &fields)
            .lpush(PENDING_LIST, &job.id);
        pipe.query_async::<_, ()>(&mut conn).await?;

        debug!(job_id = %job.id, title = %job.data.title, "job enqueued");
        Ok(job)
    }

    async fn get(&self, id: &str) -> Result<Option<Job>, StoreError> {
        self.fetch(id).await
    }

    async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        progress: u8,
        result: Option<JobResult>,
        error: Option<String>,
    ) -> Result<Option<Job>, StoreError> {
        let Some(current) = self.fetch(id).await? else {
            return Ok(None);
        };

        let plan = plan_update(&current, status, progress, result.clone(), error.clone());
        if plan.ignored {
            warn!(
                job_id = %id,
                from = current.status.as_str(),
                to = status.as_str(),
                "ignoring status transition out of a terminal state"
            );
            return Ok(Some(current));
        }

        let key = Self::job_key(id);
        let mut conn = self.redis.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset(&key, "status", status.as_str())
            .hset(&key, "progress", progress.to_string());

        // Only touch the optional fields this update actually changes;
        // untouched fields keep whatever a concurrent writer put there.
        if status == JobStatus::Failed {
            pipe.hdel(&key, "result");
        } else if let Some(result) = &result {
            pipe.hset(&key, "result", serde_json::to_string(result)?);
        }
        if status == JobStatus::Completed {
            pipe.hdel(&key, "error");
        } else if let Some(error) = &error {
            pipe.hset(&key, "error", error.clone());
        }

        if plan.terminal_move {
            pipe.lrem(PENDING_LIST, 0, id).lpush(terminal_list(status), id);
        }
        pipe.query_async::<_, ()>(&mut conn).await?;

        debug!(
            job_id = %id,
            status = status.as_str(),
            progress,
            "job status updated"
        );
        Ok(Some(plan.merged))
    }

    async fn list_pending(&self) -> Result<Vec<Job>, StoreError> {
        let mut conn = self.redis.clone();
        // Ids are LPUSHed, so the range comes back newest first
        let mut ids: Vec<String> = conn.lrange(PENDING_LIST, 0, -1).await?;
        ids.reverse();

        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(job) = self.fetch(&id).await? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(Self::job_key(id))
            .lrem(PENDING_LIST, 0, id)
            .lrem(COMPLETED_LIST, 0, id)
            .lrem(FAILED_LIST, 0, id);
        pipe.query_async::<_, ()>(&mut conn).await?;
        debug!(job_id = %id, "job removed");
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        let mut conn = self.redis.clone();
        Ok(conn.llen(PENDING_LIST).await?)
    }

    async fn completed_count(&self) -> Result<usize, StoreError> {
        let mut conn = self.redis.clone();
        Ok(conn.llen(COMPLETED_LIST).await?)
    }

    async fn failed_count(&self) -> Result<usize, StoreError> {
        let mut conn = self.redis.clone();
        Ok(conn.llen(FAILED_LIST).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Default)]
struct InMemoryState {
    jobs: HashMap<String, Job>,
    pending: Vec<String>,
    completed: Vec<String>,
    failed: Vec<String>,
}

/// In-process job store with the same semantics as [`RedisJobStore`].
///
/// Used by the test suites and by embedders that do not need durability.
#[derive(Default)]
pub struct InMemoryJobStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, request: GenerationRequest) -> Result<Job, StoreError> {
        let job = Job::new(request);
        let mut state = self.lock();
        state.pending.push(job.id.clone());
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn create_with_id(
        &self,
        id: &str,
        request: GenerationRequest,
    ) -> Result<Job, StoreError> {
        let job = Job::with_id(id, request);
        let mut state = self.lock();
        state.pending.push(job.id.clone());
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get(&self, id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self.lock().jobs.get(id).cloned())
    }

    async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        progress: u8,
        result: Option<JobResult>,
        error: Option<String>,
    ) -> Result<Option<Job>, StoreError> {
        let mut state = self.lock();
        let Some(current) = state.jobs.get(id).cloned() else {
            return Ok(None);
        };

        let plan = plan_update(&current, status, progress, result, error);
        if plan.ignored {
            warn!(
                job_id = %id,
                from = current.status.as_str(),
                to = status.as_str(),
                "ignoring status transition out of a terminal state"
            );
            return Ok(Some(current));
        }

        if plan.terminal_move {
            state.pending.retain(|pending_id| pending_id != id);
            match status {
                JobStatus::Completed => state.completed.push(id.to_string()),
                _ => state.failed.push(id.to_string()),
            }
        }
        state.jobs.insert(id.to_string(), plan.merged.clone());
        Ok(Some(plan.merged))
    }

    async fn list_pending(&self) -> Result<Vec<Job>, StoreError> {
        let state = self.lock();
        Ok(state
            .pending
            .iter()
            .filter_map(|id| state.jobs.get(id).cloned())
            .collect())
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.jobs.remove(id);
        state.pending.retain(|x| x != id);
        state.completed.retain(|x| x != id);
        state.failed.retain(|x| x != id);
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock().pending.len())
    }

    async fn completed_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock().completed.len())
    }

    async fn failed_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock().failed.len())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
