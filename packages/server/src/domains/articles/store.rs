//! Article persistence.
//!
//! Articles live as hashes keyed `article:<id>`, sharing the Redis backend
//! with the job store. The pipeline creates a pending placeholder at
//! submission time and moves it to `completed` or `error` when generation
//! settles.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::debug;

use crate::kernel::jobs::GenerationRequest;

use super::model::{Article, ArticleStatus};

/// Errors from the article store backend.
#[derive(Debug, Error)]
pub enum ArticleStoreError {
    /// Backend unreachable or operation failed.
    #[error("article store backend error: {0}")]
    Backend(String),

    /// No record for the id.
    #[error("article {0} not found")]
    NotFound(String),
}

impl From<redis::RedisError> for ArticleStoreError {
    fn from(error: redis::RedisError) -> Self {
        ArticleStoreError::Backend(error.to_string())
    }
}

impl From<serde_json::Error> for ArticleStoreError {
    fn from(error: serde_json::Error) -> Self {
        ArticleStoreError::Backend(error.to_string())
    }
}

/// Persistence seam for article records.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Create the pending placeholder at submission time.
    async fn create_pending(
        &self,
        id: &str,
        request: &GenerationRequest,
    ) -> Result<Article, ArticleStoreError>;

    async fn get(&self, id: &str) -> Result<Option<Article>, ArticleStoreError>;

    /// Attach generated content and mark the article completed.
    async fn complete(
        &self,
        id: &str,
        content: &str,
        description: &str,
    ) -> Result<Article, ArticleStoreError>;

    /// Record a generation failure on the article.
    async fn mark_error(&self, id: &str, message: &str) -> Result<(), ArticleStoreError>;
}

fn pending_article(id: &str, request: &GenerationRequest) -> Article {
    let now = Utc::now();
    Article {
        id: id.to_string(),
        title: request.title.clone(),
        content: String::new(),
        category: request.category.clone(),
        keywords: request.keywords.clone(),
        description: String::new(),
        status: ArticleStatus::Pending,
        error_message: None,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Redis backend
// ============================================================================

/// Redis-backed article store.
pub struct RedisArticleStore {
    redis: ConnectionManager,
}

impl RedisArticleStore {
    /// Create from an existing connection manager.
    pub fn from_connection(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn article_key(id: &str) -> String {
        format!("article:{id}")
    }

    fn to_fields(article: &Article) -> Result<Vec<(&'static str, String)>, ArticleStoreError> {
        let mut fields = vec![
            ("id", article.id.clone()),
            ("title", article.title.clone()),
            ("content", article.content.clone()),
            ("category", article.category.clone()),
            ("keywords", serde_json::to_string(&article.keywords)?),
            ("description", article.description.clone()),
            ("status", article.status.as_str().to_string()),
            ("created_at", article.created_at.to_rfc3339()),
            ("updated_at", article.updated_at.to_rfc3339()),
        ];
        if let Some(message) = &article.error_message {
            fields.push(("error_message", message.clone()));
        }
        Ok(fields)
    }

    fn from_fields(map: HashMap<String, String>) -> Option<Article> {
        Some(Article {
            id: map.get("id")?.clone(),
            title: map.get("title")?.clone(),
            content: map.get("content").cloned().unwrap_or_default(),
            category: map.get("category").cloned().unwrap_or_default(),
            keywords: map
                .get("keywords")
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_default(),
            description: map.get("description").cloned().unwrap_or_default(),
            status: ArticleStatus::parse(map.get("status")?)?,
            error_message: map.get("error_message").cloned(),
            created_at: parse_timestamp(map.get("created_at")?)?,
            updated_at: parse_timestamp(map.get("updated_at")?)?,
        })
    }

    async fn fetch(&self, id: &str) -> Result<Option<Article>, ArticleStoreError> {
        let mut conn = self.redis.clone();
        let map: HashMap<String, String> = conn.hgetall(Self::article_key(id)).await?;
        if map.is_empty() {
            return Ok(None);
        }
        Ok(Self::from_fields(map))
    }

    async fn write(&self, article: &Article) -> Result<(), ArticleStoreError> {
        let fields = Self::to_fields(article)?;
        let mut conn = self.redis.clone();
        conn.hset_multiple::<_, _, _, ()>(Self::article_key(&article.id), &fields)
            .await?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[async_trait]
impl ArticleStore for RedisArticleStore {
    async fn create_pending(
        &self,
        id: &str,
        request: &GenerationRequest,
    ) -> Result<Article, ArticleStoreError> {
        let article = pending_article(id, request);
        self.write(&article).await?;
        debug!(article_id = %id, title = %article.title, "article placeholder created");
        Ok(article)
    }

    async fn get(&self, id: &str) -> Result<Option<Article>, ArticleStoreError> {
        self.fetch(id).await
    }

    async fn complete(
        &self,
        id: &str,
        content: &str,
        description: &str,
    ) -> Result<Article, ArticleStoreError> {
        let mut article = self
            .fetch(id)
            .await?
            .ok_or_else(|| ArticleStoreError::NotFound(id.to_string()))?;

        article.content = content.to_string();
        article.description = description.to_string();
        article.status = ArticleStatus::Completed;
        article.error_message = None;
        article.updated_at = Utc::now();
        self.write(&article).await?;

        debug!(article_id = %id, content_len = content.len(), "article completed");
        Ok(article)
    }

    async fn mark_error(&self, id: &str, message: &str) -> Result<(), ArticleStoreError> {
        let mut article = self
            .fetch(id)
            .await?
            .ok_or_else(|| ArticleStoreError::NotFound(id.to_string()))?;

        article.status = ArticleStatus::Error;
        article.error_message = Some(message.to_string());
        article.updated_at = Utc::now();
        self.write(&article).await?;

        debug!(article_id = %id, "article marked with error");
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// In-process article store with the same semantics as [`RedisArticleStore`].
#[derive(Default)]
pub struct InMemoryArticleStore {
    articles: Mutex<HashMap<String, Article>>,
}

impl InMemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Article>> {
        self.articles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn create_pending(
        &self,
        id: &str,
        request: &GenerationRequest,
    ) -> Result<Article, ArticleStoreError> {
        let article = pending_article(id, request);
        self.lock().insert(id.to_string(), article.clone());
        Ok(article)
    }

    async fn get(&self, id: &str) -> Result<Option<Article>, ArticleStoreError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn complete(
        &self,
        id: &str,
        content: &str,
        description: &str,
    ) -> Result<Article, ArticleStoreError> {
        let mut articles = self.lock();
        let article = articles
            .get_mut(id)
            .ok_or_else(|| ArticleStoreError::NotFound(id.to_string()))?;

        article.content = content.to_string();
        article.description = description.to_string();
        article.status = ArticleStatus::Completed;
        article.error_message = None;
        article.updated_at = Utc::now();
        Ok(article.clone())
    }

    async fn mark_error(&self, id: &str, message: &str) -> Result<(), ArticleStoreError> {
        let mut articles = self.lock();
        let article = articles
            .get_mut(id)
            .ok_or_else(|| ArticleStoreError::NotFound(id.to_string()))?;

        article.status = ArticleStatus::Error;
        article.error_message = Some(message.to_string());
        article.updated_at = Utc::now();
        Ok(())
    }
}
