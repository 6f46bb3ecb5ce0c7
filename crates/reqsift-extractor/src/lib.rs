//! Reqsift Extractor
//!
//! Pulls requirement sections out of long specification documents with a
//! text-generation service.
//!
//! # Overview
//!
//! Documents are far larger than one prompt, so the extractor slides a
//! window over the paragraphs, asks the service for the requirements in each
//! window, and stitches the answers back together by title. Replies are free
//! text; structured data is salvaged from them with a cascade of
//! increasingly lenient strategies.
//!
//! # Architecture
//!
//! ```text
//! Document → Chunker → Prompt → LlmProvider → Salvage → Merge → Records
//! ```
//!
//! # Key Features
//!
//! - **Continuation prompts**: each window is told where the previous one stopped
//! - **Overlap merging**: a requirement split across windows becomes one record
//! - **Bounded retry**: transient provider failures back off and retry
//! - **Named search**: extract only the requirements asked for
//! - **Catalog extraction**: list the table of contents entries
//! - **Rematch**: resume after the last known record to find missed ones
//!
//! # Example Usage
//!
//! ```no_run
//! use reqsift_extractor::{Extractor, ExtractorConfig};
//! use reqsift_domain::Document;
//! use reqsift_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"requirements": []}"#);
//! let extractor = Extractor::new(llm, ExtractorConfig::default())?;
//!
//! let document = Document::from_raw(["3.2.1 用户登录", "a) 标识号: REQ-1.1"]);
//! let result = extractor.extract_all(&document).await?;
//!
//! for record in &result.records {
//!     println!("{}: {} chars", record.title, record.content.len());
//! }
//! println!("Skipped chunks: {}", result.failures.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod catalog;
mod config;
mod error;
mod extractor;
mod session;
mod types;

pub mod chunking;
pub mod identifier;
pub mod merge;
pub mod prompt;
pub mod rematch;
pub mod salvage;
pub mod tokenizer;

#[cfg(test)]
mod tests;

pub use catalog::catalog_entry;
pub use config::{ExtractorConfig, RetryConfig};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use rematch::locate_resume_point;
pub use session::MemorySessionStore;
pub use types::{
    chapter_depth, chapter_sort_key, CatalogEntry, ChunkFailure, ExtractionMetadata,
    ExtractionResult, NamedRequirement, RematchResult,
};
