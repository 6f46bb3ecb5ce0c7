//! Result types for extraction runs

use reqsift_domain::RequirementRecord;
use serde::Serialize;

/// Result of an "extract everything" run
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Records in first-seen order
    pub records: Vec<RequirementRecord>,

    /// Chunks that were skipped
    pub failures: Vec<ChunkFailure>,

    /// Metadata about the run
    pub metadata: ExtractionMetadata,
}

/// A chunk that produced nothing, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkFailure {
    /// 0-based chunk index
    pub chunk_index: usize,

    /// Paragraph range of the chunk, `[start, end)`
    pub paragraphs: (usize, usize),

    /// Error message
    pub reason: String,
}

/// Metadata about an extraction run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionMetadata {
    /// Timestamp when the run finished (seconds since the epoch)
    pub timestamp: u64,

    /// Name of the model used
    pub model_name: String,

    /// Number of chunks the document was split into
    pub chunks_total: usize,

    /// Chunks whose reply yielded structured data
    pub chunks_processed: usize,

    /// Candidates accepted (inserted or merged)
    pub candidates_accepted: usize,

    /// Candidates merged into an existing record
    pub candidates_merged: usize,

    /// The run stopped early because it was cancelled
    pub cancelled: bool,

    /// The run stopped early on a permanent service error
    pub aborted: Option<String>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Content found for one requested requirement name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRequirement {
    /// Name as requested
    pub name: String,

    /// Merged content
    pub content: String,
}

/// One table-of-contents entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Section number, e.g. "3.2.1"
    pub chapter: String,

    /// Entry name without the section number
    pub name: String,

    /// Depth of the section number
    pub level: usize,
}

impl CatalogEntry {
    /// Create an entry, deriving the level from the section number
    pub fn new(chapter: impl Into<String>, name: impl Into<String>) -> Self {
        let chapter = chapter.into();
        let level = chapter_depth(&chapter);
        Self {
            chapter,
            name: name.into(),
            level,
        }
    }
}

/// Result of a rematch pass
#[derive(Debug, Clone)]
pub struct RematchResult {
    /// Previously matched records followed by the newly found ones
    pub records: Vec<RequirementRecord>,

    /// Number of records added by this pass
    pub added: usize,

    /// Paragraph index the pass resumed from
    pub resume_index: usize,
}

/// Number of dot-separated parts in a section number ("3.2.1" is 3)
pub fn chapter_depth(chapter: &str) -> usize {
    chapter
        .trim()
        .trim_end_matches('.')
        .split('.')
        .filter(|part| !part.is_empty())
        .count()
}

/// Numeric sort key for a section number; non-numeric parts sort last
pub fn chapter_sort_key(chapter: &str) -> Vec<u64> {
    chapter
        .trim()
        .trim_end_matches('.')
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u64>().unwrap_or(u64::MAX))
        .collect()
}
