//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and
//! infrastructure. Implementations live in other crates.

use crate::session::ExtractionSession;

/// Classifies an error as retryable or not
///
/// Implemented by provider error types so the orchestrator can decide
/// between backing off and aborting the document.
pub trait TransientError {
    /// True for timeouts, 5xx responses, rate limits and connection failures
    fn is_transient(&self) -> bool;
}

/// Trait for text generation services
///
/// Implemented by the infrastructure layer (reqsift-llm). The contract is
/// prompt in, free-form text out; nothing about the reply format is promised.
pub trait LlmProvider {
    /// Error type for generation calls
    type Error: TransientError + std::fmt::Display;

    /// Generate a completion, optionally overriding the configured model
    fn generate(&self, prompt: &str, model_hint: Option<&str>) -> Result<String, Self::Error>;

    /// Name of the model used when no hint is given
    fn model_name(&self) -> &str;
}

/// Get/put store for extraction sessions
///
/// Any backing works: an in-memory map, files, an external cache.
pub trait SessionStore {
    /// Fetch the session stored under `key`
    fn get(&self, key: &str) -> Option<ExtractionSession>;

    /// Store (or replace) the session under `key`
    fn put(&self, key: String, session: ExtractionSession);
}
