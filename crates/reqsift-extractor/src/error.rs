//! Error types for the Extractor

use reqsift_domain::traits::TransientError;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Retryable provider failure that survived every retry attempt
    #[error("Transient service error: {0}")]
    TransientService(String),

    /// Credentials or provider configuration rejected; aborts the document
    #[error("Permanent service error: {0}")]
    PermanentService(String),

    /// No structured data could be salvaged from a reply
    #[error("Salvage failure: {0}")]
    SalvageFailure(String),

    /// Configuration rejected before any chunk was processed
    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    /// A single generation call exceeded its deadline
    #[error("Generation call timed out after {0}s")]
    Timeout(u64),

    /// The run was cancelled between chunks
    #[error("Extraction cancelled")]
    Cancelled,

    /// The blocking provider task panicked or was aborted
    #[error("Task join error: {0}")]
    Join(String),
}

impl ExtractorError {
    /// True when the error must abort the whole document rather than one chunk
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractorError::PermanentService(_)
                | ExtractorError::InvalidConfiguration(_)
                | ExtractorError::Cancelled
        )
    }
}

impl TransientError for ExtractorError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractorError::TransientService(_) | ExtractorError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(ExtractorError::PermanentService("bad key".into()).is_fatal());
        assert!(ExtractorError::InvalidConfiguration("x".into()).is_fatal());
        assert!(!ExtractorError::TransientService("503".into()).is_fatal());
        assert!(!ExtractorError::SalvageFailure("prose".into()).is_fatal());
        assert!(!ExtractorError::Timeout(120).is_fatal());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ExtractorError::TransientService("503".into()).is_transient());
        assert!(ExtractorError::Timeout(5).is_transient());
        assert!(!ExtractorError::PermanentService("401".into()).is_transient());
        assert!(!ExtractorError::Join("panic".into()).is_transient());
    }
}
