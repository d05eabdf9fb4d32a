//! Job infrastructure for asynchronous article generation.
//!
//! This module provides the kernel-level pieces of the job subsystem:
//! - [`Job`] - Job model with status, progress and result
//! - [`JobStore`] - Storage contract over the job record and its queue lists
//! - [`RedisJobStore`] / [`InMemoryJobStore`] - Backend implementations
//! - [`Worker`] - Long-running service that drains the pending queue
//! - [`poll_until_terminal`] - Client-side polling discipline
//!
//! # Architecture
//!
//! ```text
//! Submission handler calls store.create(request)
//!     │
//!     └─► HSET job:<id> + LPUSH job:queue
//!
//! Worker
//!     │
//!     ├─► Poll pending list (store.list_pending)
//!     ├─► Pipeline.run(job)
//!     │       └─► progress + terminal writes via store.update_status
//!     └─► Safety net: force a terminal write if the pipeline failed to
//!
//! Status handler / poller
//!     │
//!     └─► store.get(id) until a terminal status appears
//! ```

pub mod job;
pub mod poller;
pub mod store;
pub mod worker;

pub use job::{progress, GenerationRequest, Job, JobResult, JobStatus, JobStatusView};
pub use poller::{poll_until_terminal, PollOutcome};
pub use store::{
    connect_redis, InMemoryJobStore, JobStore, RedisJobStore, StoreError, COMPLETED_LIST,
    FAILED_LIST, PENDING_LIST,
};
pub use worker::{Worker, WorkerConfig};
