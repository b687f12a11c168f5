/*!
 * Mock backend implementations for testing.
 *
 * This module provides mock backends that simulate different behaviors:
 * - `MockBackend::working()` - Always succeeds with translated text
 * - `MockBackend::intermittent(n)` - Fails every nth request
 * - `MockBackend::failing()` - Always fails with an error
 * - `MockBackend::empty()` - Returns empty translations
 * - `MockBackend::slow(ms)` - Succeeds after a delay
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::BackendError;

use super::TranslationBackend;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a deterministic translation
    Working,
    /// Fails intermittently (every nth request)
    Intermittent {
        /// Every nth request fails
        fail_every: usize,
    },
    /// Always fails with an error
    Failing,
    /// Returns empty responses
    Empty,
    /// Simulates slow responses (for timeout/cancellation testing)
    Slow {
        /// Delay before responding
        delay_ms: u64,
    },
}

/// Mock backend for testing orchestrator behavior
#[derive(Debug)]
pub struct MockBackend {
    /// Backend id reported to the orchestrator
    id: String,
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, also used for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str) -> String>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(id: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            id: id.into(),
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new("mock-working", MockBehavior::Working)
    }

    /// Create an intermittently failing mock backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new("mock-intermittent", MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new("mock-failing", MockBehavior::Failing)
    }

    /// Create a mock that returns empty translations
    pub fn empty() -> Self {
        Self::new("mock-empty", MockBehavior::Empty)
    }

    /// Create a mock that succeeds after a delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new("mock-slow", MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of translate calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the request counter, for assertions after the
    /// backend has been moved into the orchestrator
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        self.request_count.clone()
    }

    fn respond(&self, text: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(text),
            None => format!("[{}] {}", self.id, text),
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String, BackendError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(text)),
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == 0 {
                    Err(BackendError::RequestFailed(format!(
                        "simulated intermittent failure on request {}",
                        count
                    )))
                } else {
                    Ok(self.respond(text))
                }
            }
            MockBehavior::Failing => Err(BackendError::ConnectionError(
                "simulated permanent outage".to_string(),
            )),
            MockBehavior::Empty => Ok(String::new()),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.respond(text))
            }
        }
    }
}
