//! Job model for asynchronous article generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress milestones reported by the generation pipeline.
pub mod progress {
    /// Request validated, generation about to start
    pub const STARTED: u8 = 10;
    /// Outline available (generated when the request carried none)
    pub const OUTLINE_READY: u8 = 30;
    /// First half of the body generated
    pub const FIRST_HALF_DONE: u8 = 50;
    /// Terminal success
    pub const COMPLETED: u8 = 100;
}

/// Canonical job states.
///
/// The wire format keeps the original spellings (`waiting`, `generating`).
/// Deserialization additionally accepts `error` and `active`, which older
/// entry points used interchangeably with `failed` and `generating`; both
/// map onto the canonical terminal/running variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JobStatus {
    #[default]
    #[serde(rename = "waiting")]
    Pending,
    #[serde(rename = "generating", alias = "active")]
    Running,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed", alias = "error")]
    Failed,
}

impl JobStatus {
    /// Whether no further transition may occur from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Wire spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "waiting",
            JobStatus::Running => "generating",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse a wire spelling, accepting the legacy aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(JobStatus::Pending),
            "generating" | "active" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" | "error" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// The generation request payload carried by a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub title: String,
    /// Ordered section headings; empty means the pipeline generates one
    #[serde(default)]
    pub outline: Vec<String>,
    pub keywords: Vec<String>,
    pub category: String,
}

/// Finished output of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub title: String,
    pub content: String,
    pub summary: String,
}

/// A tracked unit of asynchronous article-generation work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub data: GenerationRequest,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Create a job with a fresh id.
    ///
    /// Requests are accepted immediately, so new jobs start out `Running`
    /// rather than sitting in a separate waiting state.
    pub fn new(data: GenerationRequest) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), data)
    }

    /// Create a job with a caller-supplied id (shared with the article record).
    pub fn with_id(id: impl Into<String>, data: GenerationRequest) -> Self {
        Self {
            id: id.into(),
            name: "generate".to_string(),
            data,
            status: JobStatus::Running,
            created_at: Utc::now(),
            progress: 0,
            result: None,
            error: None,
        }
    }

    /// Snapshot for the status endpoint.
    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            id: self.id.clone(),
            status: self.status,
            progress: self.progress,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// What a polling client sees: `{id, status, progress, result?, error?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            title: "Example".to_string(),
            outline: vec![],
            keywords: vec!["k1".to_string()],
            category: "c".to_string(),
        }
    }

    #[test]
    fn test_status_wire_spellings() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Running).unwrap(),
            "\"generating\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Pending).unwrap(),
            "\"waiting\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn test_legacy_spellings_map_to_canonical_variants() {
        let status: JobStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, JobStatus::Failed);

        let status: JobStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(status, JobStatus::Running);

        assert_eq!(JobStatus::parse("error"), Some(JobStatus::Failed));
        assert_eq!(JobStatus::parse("active"), Some(JobStatus::Running));
        assert_eq!(JobStatus::parse("bogus"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }

    #[test]
    fn test_new_job_starts_running_with_zero_progress() {
        let job = Job::new(request());
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.progress, 0);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_status_view_omits_unset_optionals() {
        let job = Job::with_id("j1", request());
        let view = serde_json::to_value(job.status_view()).unwrap();
        assert_eq!(view["id"], "j1");
        assert_eq!(view["status"], "generating");
        assert!(view.get("result").is_none());
        assert!(view.get("error").is_none());
    }
}
