//! Heuristic extractor error types

use thiserror::Error;

/// Errors that can occur while setting up or running the boundary extractor
///
/// A name that cannot be found, or whose content fails the validity gate, is
/// not an error; see [`crate::LocateOutcome`].
#[derive(Error, Debug)]
pub enum HeuristicError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A keyword table entry produced an unusable pattern
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// A worker thread panicked
    #[error("Worker error: {0}")]
    Worker(String),
}
