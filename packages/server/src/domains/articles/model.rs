//! Article model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an article record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Placeholder created at submission, content not yet generated
    Pending,
    /// Content generated and persisted
    Completed,
    /// Generation failed; `error_message` says why
    Error,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Completed => "completed",
            ArticleStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ArticleStatus::Pending),
            "completed" => Some(ArticleStatus::Completed),
            "error" => Some(ArticleStatus::Error),
            _ => None,
        }
    }
}

/// A persisted content entity, correlated with its generation job by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub description: String,
    pub status: ArticleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
