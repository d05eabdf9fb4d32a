//! Failure taxonomy for the generation pipeline.

use std::time::Duration;

use thiserror::Error;

use super::generator::GeneratorError;

/// Everything that can go wrong while generating an article.
///
/// The retry loop branches on [`GenerationError::is_retryable`]; the status
/// record carries [`GenerationError::user_message`]. Nothing classifies
/// failures by message text.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Malformed or incomplete request. Never retried.
    #[error("request validation failed: {0}")]
    Validation(String),

    /// Provider credential rejected. Operator-actionable, never retried.
    #[error("generation provider rejected the API key")]
    InvalidApiKey,

    /// Provider rate/quota limit. Terminal for this job, never retried.
    #[error("generation provider quota exhausted")]
    QuotaExceeded,

    /// Transient provider failure. Retried up to the attempt cap.
    #[error("generation provider error: {0}")]
    ApiServer(String),

    /// Retries exhausted without usable content.
    #[error("content generation failed")]
    ContentGenerationFailed,

    /// The article was generated but persisting it failed. Terminal; the
    /// generation work is not repeated.
    #[error("failed to save generated article: {0}")]
    SaveFailed(String),

    /// The overall pipeline deadline elapsed.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// Catch-all. The original detail is preserved for diagnostics.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl GenerationError {
    /// Whether the retry loop may re-run the failed step.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::ApiServer(_))
    }

    /// Operator-facing message recorded on the job and article.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Validation(msg) => format!("Invalid request: {msg}"),
            GenerationError::InvalidApiKey => {
                "The generation API key is invalid. Contact the system administrator.".to_string()
            }
            GenerationError::QuotaExceeded => {
                "The generation API quota has been reached. Try again in about an hour.".to_string()
            }
            GenerationError::ApiServer(_) => {
                "The generation provider returned an error. Wait a moment and try again."
                    .to_string()
            }
            GenerationError::ContentGenerationFailed => {
                "Article generation failed. Please try again.".to_string()
            }
            GenerationError::SaveFailed(_) => "Failed to save the generated article.".to_string(),
            GenerationError::Timeout(_) => "Generation timed out.".to_string(),
            GenerationError::Unexpected(_) => "An unexpected error occurred.".to_string(),
        }
    }
}

impl From<GeneratorError> for GenerationError {
    fn from(error: GeneratorError) -> Self {
        match error {
            GeneratorError::InvalidApiKey(_) => GenerationError::InvalidApiKey,
            GeneratorError::RateLimited(_) => GenerationError::QuotaExceeded,
            GeneratorError::Server(msg) | GeneratorError::Network(msg) => {
                GenerationError::ApiServer(msg)
            }
            GeneratorError::InvalidRequest(msg) => GenerationError::Unexpected(msg),
            GeneratorError::Empty => {
                GenerationError::ApiServer("provider returned empty content".to_string())
            }
        }
    }
}
