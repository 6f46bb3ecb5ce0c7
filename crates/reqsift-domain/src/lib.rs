//! Reqsift Domain Layer
//!
//! Core model shared by every reqsift crate. Apart from `uuid` for session
//! identifiers it has no external dependencies, and it defines the trait
//! seams that infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Document**: ordered paragraphs (plus tables) extracted from a source file
//! - **Chunk**: a bounded window of paragraphs handed to the generation service
//! - **RequirementCandidate**: one item salvaged from a single chunk's reply
//! - **RequirementRecord**: the accumulated, merged requirement keyed by title
//! - **ExtractionSession**: the last result of a run, kept for a later rematch
//!
//! ## Architecture
//!
//! - Pure data and ordering rules only
//! - Generation providers implement [`traits::LlmProvider`] (reqsift-llm)
//! - Session backends implement [`traits::SessionStore`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod document;
pub mod requirement;
pub mod session;
pub mod traits;

// Re-exports for convenience
pub use chunk::Chunk;
pub use document::{Document, Table};
pub use requirement::{RecordSet, RequirementCandidate, RequirementRecord, UpsertOutcome};
pub use session::{ExtractionSession, SessionId};
