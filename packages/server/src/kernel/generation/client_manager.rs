//! Explicitly constructed provider-client manager.
//!
//! The client is built once and handed out as a shared reference; the
//! credential is revalidated whenever the validation interval has elapsed,
//! measured against an injected clock so the behavior is testable without
//! waiting out real time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use anthropic_client::AnthropicClient;

use super::generator::GeneratorError;

/// How often the credential is re-checked and the client rebuilt.
const DEFAULT_VALIDATION_INTERVAL: Duration = Duration::from_secs(300);

/// Injected time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock [`Clock`] used in production.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct ManagerState {
    client: Option<Arc<AnthropicClient>>,
    validated_at: Option<Instant>,
}

/// Owns the provider client and its revalidation schedule.
pub struct ClientManager {
    api_key: String,
    validation_interval: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<ManagerState>,
}

impl ClientManager {
    pub fn new(api_key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api_key: api_key.into(),
            validation_interval: DEFAULT_VALIDATION_INTERVAL,
            clock,
            state: Mutex::new(ManagerState {
                client: None,
                validated_at: None,
            }),
        }
    }

    /// Override the revalidation interval.
    pub fn with_validation_interval(mut self, interval: Duration) -> Self {
        self.validation_interval = interval;
        self
    }

    /// Shared client, rebuilding it when the validation interval elapsed.
    ///
    /// An empty credential surfaces as [`GeneratorError::InvalidApiKey`].
    pub fn client(&self) -> Result<Arc<AnthropicClient>, GeneratorError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();

        if let (Some(client), Some(validated_at)) = (&state.client, state.validated_at) {
            if now.duration_since(validated_at) <= self.validation_interval {
                return Ok(Arc::clone(client));
            }
        }

        if self.api_key.trim().is_empty() {
            return Err(GeneratorError::InvalidApiKey(
                "generation credential is not configured".to_string(),
            ));
        }

        let client = Arc::new(AnthropicClient::new(self.api_key.clone()));
        state.client = Some(Arc::clone(&client));
        state.validated_at = Some(now);
        debug!("generation client (re)initialized");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Clock that only moves when told to.
    struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn test_client_is_reused_within_the_interval() {
        let clock = Arc::new(ManualClock::new());
        let manager = ClientManager::new("sk-ant-test", clock.clone())
            .with_validation_interval(Duration::from_secs(300));

        let first = manager.client().unwrap();
        clock.advance(Duration::from_secs(100));
        let second = manager.client().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_client_is_rebuilt_after_the_interval() {
        let clock = Arc::new(ManualClock::new());
        let manager = ClientManager::new("sk-ant-test", clock.clone())
            .with_validation_interval(Duration::from_secs(300));

        let first = manager.client().unwrap();
        clock.advance(Duration::from_secs(301));
        let second = manager.client().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_empty_credential_is_rejected() {
        let manager = ClientManager::new("   ", Arc::new(SystemClock));
        let error = manager.client().expect_err("blank key must be rejected");
        assert!(matches!(error, GeneratorError::InvalidApiKey(_)));
    }
}
