//! Error types for the Anthropic client.

use thiserror::Error;

/// Result type for Anthropic client operations.
pub type Result<T> = std::result::Result<T, AnthropicError>;

/// Anthropic client errors.
///
/// Failures carry a structured variant so callers branch on the kind of
/// failure rather than matching substrings of the message text.
#[derive(Debug, Error)]
pub enum AnthropicError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential rejected by the API (HTTP 401 / `authentication_error`)
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    /// Rate or quota limit reached (HTTP 429 / `rate_limit_error`)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider-side failure (HTTP 5xx / `overloaded_error`)
    #[error("API server error: {0}")]
    Server(String),

    /// Request rejected as invalid (other non-2xx responses)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}
