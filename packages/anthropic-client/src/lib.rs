//! Pure Anthropic REST API client
//!
//! A clean, minimal client for the Anthropic Messages API with no
//! domain-specific logic. Failures are classified into structured variants
//! (invalid key, rate limit, server error, ...) from the HTTP status and the
//! API's error envelope, so callers never have to inspect message text.
//!
//! # Example
//!
//! ```rust,ignore
//! use anthropic_client::{AnthropicClient, MessageRequest};
//!
//! let client = AnthropicClient::from_env()?;
//!
//! let response = client
//!     .create_message(
//!         MessageRequest::user_turn("claude-3-sonnet-20240229", 1000, "Hello!")
//!             .with_temperature(0.3),
//!     )
//!     .await?;
//!
//! println!("{}", response.text());
//! ```

pub mod error;
pub mod types;

pub use error::{AnthropicError, Result};
pub use types::*;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// API version header value required by the Messages API.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Pure Anthropic API client.
#[derive(Clone, Debug)]
pub struct AnthropicClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
        }
    }

    /// Create from environment variable `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AnthropicError::Config("ANTHROPIC_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies or compatible gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a message request and return the model's response.
    pub async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Anthropic request failed");
                AnthropicError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Anthropic API error");
            return Err(classify_api_error(status, &error_text));
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| AnthropicError::Parse(e.to_string()))?;

        debug!(
            model = %request.model,
            output_tokens = message.usage.output_tokens,
            duration_ms = start.elapsed().as_millis(),
            "Anthropic message completion"
        );

        Ok(message)
    }
}

/// Map a non-2xx response to a structured error.
///
/// The error envelope's `type` field is authoritative when present; the HTTP
/// status code covers responses with no parseable body.
fn classify_api_error(status: StatusCode, body: &str) -> AnthropicError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let (kind, message) = match &envelope {
        Some(e) => (e.error.kind.as_str(), e.error.message.clone()),
        None => ("", body.to_string()),
    };

    match kind {
        "authentication_error" | "permission_error" => {
            return AnthropicError::InvalidApiKey(message)
        }
        "rate_limit_error" => return AnthropicError::RateLimited(message),
        "overloaded_error" | "api_error" => return AnthropicError::Server(message),
        _ => {}
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        AnthropicError::InvalidApiKey(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        AnthropicError::RateLimited(message)
    } else if status.is_server_error() {
        AnthropicError::Server(message)
    } else {
        AnthropicError::InvalidRequest(message)
    }
}
