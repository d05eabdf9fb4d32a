//! Text-generation capability seam.

use async_trait::async_trait;
use thiserror::Error;

use anthropic_client::{AnthropicError, MessageRequest};

use super::client_manager::ClientManager;

/// Sampling temperature for article generation calls.
const TEMPERATURE: f32 = 0.3;

/// Structured failure codes from a text-generation provider.
///
/// Every provider implementation maps its own errors onto these variants;
/// downstream code branches on the variant, never on message text.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("provider server error: {0}")]
    Server(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned empty content")]
    Empty,
}

/// Capability that turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`, bounded by `max_tokens` output tokens.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GeneratorError>;
}

/// [`TextGenerator`] backed by the Anthropic Messages API.
pub struct AnthropicTextGenerator {
    manager: ClientManager,
    model: String,
}

impl AnthropicTextGenerator {
    pub fn new(manager: ClientManager, model: impl Into<String>) -> Self {
        Self {
            manager,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicTextGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GeneratorError> {
        let client = self.manager.client()?;

        let request = MessageRequest::user_turn(self.model.clone(), max_tokens, prompt)
            .with_temperature(TEMPERATURE);
        let response = client
            .create_message(request)
            .await
            .map_err(map_client_error)?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(GeneratorError::Empty);
        }
        Ok(text)
    }
}

fn map_client_error(error: AnthropicError) -> GeneratorError {
    match error {
        AnthropicError::Config(msg) | AnthropicError::InvalidApiKey(msg) => {
            GeneratorError::InvalidApiKey(msg)
        }
        AnthropicError::RateLimited(msg) => GeneratorError::RateLimited(msg),
        // A malformed provider response is treated like a provider failure
        AnthropicError::Server(msg) | AnthropicError::Parse(msg) => GeneratorError::Server(msg),
        AnthropicError::InvalidRequest(msg) => GeneratorError::InvalidRequest(msg),
        AnthropicError::Network(msg) => GeneratorError::Network(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_onto_generator_codes() {
        assert!(matches!(
            map_client_error(AnthropicError::RateLimited("busy".into())),
            GeneratorError::RateLimited(_)
        ));
        assert!(matches!(
            map_client_error(AnthropicError::Config("no key".into())),
            GeneratorError::InvalidApiKey(_)
        ));
        assert!(matches!(
            map_client_error(AnthropicError::Parse("bad json".into())),
            GeneratorError::Server(_)
        ));
        assert!(matches!(
            map_client_error(AnthropicError::Network("reset".into())),
            GeneratorError::Network(_)
        ));
    }
}
