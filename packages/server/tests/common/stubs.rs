//! Scripted [`TextGenerator`] implementations.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use server_core::kernel::generation::{GeneratorError, TextGenerator};

/// Returns the same non-empty text for every call, counting calls.
pub struct FixedGenerator {
    text: String,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl FixedGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Sleep before answering, so pollers can observe intermediate progress.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.text.clone())
    }
}

/// Fails every call with the given error, counting calls.
pub struct FailingGenerator {
    error: GeneratorError,
    calls: AtomicU32,
}

impl FailingGenerator {
    pub fn new(error: GeneratorError) -> Self {
        Self {
            error,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Never answers within any realistic test deadline.
pub struct StalledGenerator;

#[async_trait]
impl TextGenerator for StalledGenerator {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GeneratorError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(GeneratorError::Empty)
    }
}
