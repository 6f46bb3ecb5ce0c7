//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction error
    #[error("Extraction error: {0}")]
    Extractor(#[from] reqsift_extractor::ExtractorError),

    /// Heuristic extractor error
    #[error("Heuristic error: {0}")]
    Heuristic(#[from] reqsift_heuristic::HeuristicError),

    /// Generation provider error
    #[error("Provider error: {0}")]
    Provider(#[from] reqsift_llm::LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Document could not be loaded
    #[error("Document error: {0}")]
    Document(String),

    /// Session missing or unreadable
    #[error("Session error: {0}")]
    Session(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
