//! Client-side status polling discipline.
//!
//! Callers poll at a fixed interval up to a fixed attempt cap. Running out
//! of attempts is a client-observed timeout - distinct from the pipeline's
//! own deadline, which shows up as a `failed` job with a timeout message.

use std::time::Duration;

use tracing::debug;

use super::job::Job;
use super::store::{JobStore, StoreError};

/// Result of polling a job to a conclusion.
#[derive(Debug)]
pub enum PollOutcome {
    /// The job reached `completed` or `failed`.
    Terminal(Job),
    /// The attempt cap ran out before any terminal status appeared.
    TimedOut { attempts: u32 },
}

/// Poll `store` for `id` until a terminal status or the attempt cap.
///
/// Unknown ids are polled like any other - a job that never materializes
/// surfaces as a timeout.
pub async fn poll_until_terminal(
    store: &dyn JobStore,
    id: &str,
    interval: Duration,
    max_attempts: u32,
) -> Result<PollOutcome, StoreError> {
    for attempt in 1..=max_attempts {
        if let Some(job) = store.get(id).await? {
            if job.status.is_terminal() {
                debug!(job_id = %id, attempt, status = job.status.as_str(), "job settled");
                return Ok(PollOutcome::Terminal(job));
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(PollOutcome::TimedOut {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::jobs::{GenerationRequest, JobResult, JobStatus};
    use crate::kernel::jobs::store::InMemoryJobStore;

    fn request() -> GenerationRequest {
        GenerationRequest {
            title: "Example".to_string(),
            outline: vec![],
            keywords: vec!["k1".to_string()],
            category: "c".to_string(),
        }
    }

    #[tokio::test]
    async fn test_poller_returns_terminal_job() {
        let store = InMemoryJobStore::new();
        let job = store.create(request()).await.unwrap();
        store
            .update_status(
                &job.id,
                JobStatus::Completed,
                100,
                Some(JobResult {
                    title: "Example".to_string(),
                    content: "body".to_string(),
                    summary: "s".to_string(),
                }),
                None,
            )
            .await
            .unwrap();

        let outcome =
            poll_until_terminal(&store, &job.id, Duration::from_millis(1), 5).await.unwrap();
        match outcome {
            PollOutcome::Terminal(settled) => assert_eq!(settled.status, JobStatus::Completed),
            PollOutcome::TimedOut { .. } => panic!("expected terminal outcome"),
        }
    }

    #[tokio::test]
    async fn test_poller_times_out_on_stuck_job() {
        let store = InMemoryJobStore::new();
        let job = store.create(request()).await.unwrap();

        let outcome =
            poll_until_terminal(&store, &job.id, Duration::from_millis(1), 3).await.unwrap();
        match outcome {
            PollOutcome::TimedOut { attempts } => assert_eq!(attempts, 3),
            PollOutcome::Terminal(_) => panic!("expected client-observed timeout"),
        }
    }

    #[tokio::test]
    async fn test_poller_times_out_on_unknown_id() {
        let store = InMemoryJobStore::new();
        let outcome =
            poll_until_terminal(&store, "missing", Duration::from_millis(1), 2).await.unwrap();
        assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 2 }));
    }
}
