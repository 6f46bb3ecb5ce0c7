//! Reqsift Generation Provider Layer
//!
//! Pluggable text-generation providers behind the `LlmProvider` trait from
//! `reqsift-domain`, plus the bounded retry policy the extractor wraps around
//! every call.
//!
//! # Providers
//!
//! - `MockProvider`: scripted responses for testing
//! - `OllamaProvider`: local Ollama API
//! - `OpenAiProvider`: any OpenAI-compatible chat completions endpoint
//!
//! # Examples
//!
//! ```
//! use reqsift_llm::MockProvider;
//! use reqsift_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt", None).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;
pub mod retry;
mod runtime;

use reqsift_domain::traits::{LlmProvider as LlmProviderTrait, TransientError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use retry::RetryPolicy;

/// Errors that can occur during generation calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Service returned a 5xx status
    #[error("Server error {0}: {1}")]
    ServerError(u16, String),

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Invalid response envelope from the service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider misconfigured
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransientError for LlmError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_)
                | LlmError::Timeout
                | LlmError::RateLimitExceeded
                | LlmError::ServerError(_, _)
        )
    }
}

impl LlmError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            401 | 403 => LlmError::Authentication(format!("HTTP {}: {}", status, body)),
            404 => LlmError::ModelNotAvailable(model.to_string()),
            408 => LlmError::Timeout,
            429 => LlmError::RateLimitExceeded,
            500..=599 => LlmError::ServerError(status, body),
            _ => LlmError::InvalidResponse(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Map a transport error from reqwest
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Communication(format!("Request failed: {}", e))
        }
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(LlmError),
}

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<MockReply>,
    rules: Vec<(String, MockReply)>,
    prompts: Vec<String>,
}

/// Mock provider for deterministic testing
///
/// Replies are chosen in this order:
/// 1. the next queued reply (`push_response` / `push_error`), if any
/// 2. the first rule whose fragment occurs in the prompt (`add_response` / `add_error`)
/// 3. the default response
///
/// Every prompt received is recorded and can be inspected with `prompts()`.
///
/// # Examples
///
/// ```
/// use reqsift_llm::MockProvider;
/// use reqsift_domain::traits::LlmProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("login", "login reply");
/// provider.push_response("first call");
/// assert_eq!(provider.generate("about login", None).unwrap(), "first call");
/// assert_eq!(provider.generate("about login", None).unwrap(), "login reply");
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    model: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            model: "mock".to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Reply with `response` whenever the prompt contains `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        self.lock()
            .rules
            .push((fragment.into(), MockReply::Text(response.into())));
    }

    /// Fail with `error` whenever the prompt contains `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>, error: LlmError) {
        self.lock().rules.push((fragment.into(), MockReply::Fail(error)));
    }

    /// Queue a reply for the next call
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock().queue.push_back(MockReply::Text(response.into()));
    }

    /// Queue a failure for the next call
    pub fn push_error(&self, error: LlmError) {
        self.lock().queue.push_back(MockReply::Fail(error));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    /// Reset recorded prompts
    pub fn reset_call_count(&self) {
        self.lock().prompts.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned mock only means another test thread panicked mid-call.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, _model_hint: Option<&str>) -> Result<String, Self::Error> {
        let mut state = self.lock();
        state.prompts.push(prompt.to_string());

        let reply = state.queue.pop_front().or_else(|| {
            state
                .rules
                .iter()
                .find(|(fragment, _)| prompt.contains(fragment.as_str()))
                .map(|(_, reply)| reply.clone())
        });

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(e)) => Err(e),
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
