/*!
 * Mock provider implementations for testing.
 *
 * The mock reads the batch back out of the prompt and answers in the
 * response format the workers expect. Behaviors:
 * - `MockProvider::working()` - Always answers every entry
 * - `MockProvider::one_short()` - Answers one entry fewer than asked
 * - `MockProvider::failing()` - Always fails with a server error
 * - `MockProvider::auth_failing()` - Always rejects the credential
 * - `MockProvider::stalling_after(n)` - Answers n calls, then never returns
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::translation::prompts::{PromptEntry, extract_entries};

/// Text appended by the working mock; reads as target-language script
pub const MOCK_TRANSLATION_SUFFIX: &str = " (đã dịch)";

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always answers every entry
    Working,
    /// Drops the last entry of every answer
    OneShort,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with a server error
    Failing,
    /// Always fails authentication
    AuthFailing,
    /// Answers with prose instead of JSON
    Malformed,
    /// Answers the first `calls` requests, then hangs
    StallingAfter { calls: usize },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&[PromptEntry]) -> String>,
    /// Label used in logs
    label: String,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
            label: "mock".to_string(),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that always answers one entry short
    pub fn one_short() -> Self {
        Self::new(MockBehavior::OneShort)
    }

    /// Create a mock that fails every `fail_every`-th request; a period of zero acts as one
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock whose credential is always rejected
    pub fn auth_failing() -> Self {
        Self::new(MockBehavior::AuthFailing)
    }

    /// Create a mock that answers with prose
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that hangs after `calls` answered requests
    pub fn stalling_after(calls: usize) -> Self {
        Self::new(MockBehavior::StallingAfter { calls })
    }

    /// Set the label shown in logs
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&[PromptEntry]) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far, across clones
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Deterministic translation of one entry
    pub fn translate_text(text: &str) -> String {
        format!("{}{}", text, MOCK_TRANSLATION_SUFFIX)
    }

    /// Generate a well-formed response for the given entries
    pub fn generate_batch_response(entries: &[PromptEntry]) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| json!({ "index": e.index, "translation": Self::translate_text(&e.text) }))
            .collect();
        serde_json::Value::Array(items).to_string()
    }

    fn answer(&self, prompt: &str) -> Result<String, ProviderError> {
        let entries = extract_entries(prompt)
            .ok_or_else(|| ProviderError::RequestFailed("Mock could not read the batch from the prompt".to_string()))?;
        Ok(match self.custom_response {
            Some(generator) => generator(&entries),
            None => Self::generate_batch_response(&entries),
        })
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            custom_response: self.custom_response,
            label: self.label.clone(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => self.answer(prompt),

            MockBehavior::OneShort => {
                let mut entries = extract_entries(prompt).unwrap_or_default();
                entries.pop();
                Ok(Self::generate_batch_response(&entries))
            }

            MockBehavior::Intermittent { fail_every } => {
                let period = fail_every.max(1);
                if count % period == period - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    self.answer(prompt)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::AuthFailing => Err(ProviderError::AuthenticationError(
                "Simulated invalid API key".to_string(),
            )),

            MockBehavior::Malformed => Ok("Sorry, I can only translate one line at a time.".to_string()),

            MockBehavior::StallingAfter { calls } => {
                if count >= calls {
                    std::future::pending::<()>().await;
                }
                self.answer(prompt)
            }
        }
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}
