//! Table-of-contents extraction
//!
//! The catalog pass uses character-budgeted chunks that are far larger than
//! the requirement windows, since a table of contents is dense and short.

use crate::chunking::chunk_by_chars;
use crate::error::ExtractorError;
use crate::extractor::Extractor;
use crate::prompt::{PromptBuilder, PromptKind};
use crate::types::{chapter_depth, chapter_sort_key, CatalogEntry};
use reqsift_domain::traits::LlmProvider;
use reqsift_domain::{Document, RequirementCandidate};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

impl<L> Extractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
{
    /// Extract the requirement entries of the document's table of contents
    ///
    /// Entries shallower than `requirement_level` are dropped, duplicate
    /// chapters keep their first sighting, and the result is sorted by
    /// chapter number.
    pub async fn extract_catalog(&self, document: &Document) -> Result<Vec<CatalogEntry>, ExtractorError> {
        self.config().validate()?;
        let level = self.config().requirement_level;

        let chunks = chunk_by_chars(
            document.paragraphs(),
            self.config().catalog_max_chars,
            self.config().catalog_overlap_chars,
        );
        info!("Extracting catalog from {} chunks (level >= {})", chunks.len(), level);

        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            if self.is_cancelled() {
                warn!("Catalog extraction cancelled before chunk {}", idx + 1);
                break;
            }

            let kind = if idx == 0 {
                PromptKind::Catalog {
                    requirement_level: level,
                }
            } else {
                PromptKind::CatalogContinuation {
                    requirement_level: level,
                    chunk_number: idx + 1,
                }
            };
            let prompt = PromptBuilder::new(chunk.text.as_str(), kind).build();

            let salvaged = match self.request(prompt).await {
                Ok(salvaged) => salvaged,
                Err(e) if e.is_fatal() => {
                    error!("Aborting catalog extraction: {}", e);
                    break;
                }
                Err(e) => {
                    warn!("Skipping catalog chunk {}: {}", idx + 1, e);
                    continue;
                }
            };

            let mut added = 0;
            for candidate in salvaged.candidates() {
                let Some(entry) = catalog_entry(&candidate, level) else {
                    continue;
                };
                if seen.insert(entry.chapter.clone()) {
                    entries.push(entry);
                    added += 1;
                }
            }
            debug!("Catalog chunk {}: {} new entries", idx + 1, added);
        }

        entries.sort_by_key(|e| chapter_sort_key(&e.chapter));
        info!("Catalog extraction complete: {} entries", entries.len());
        Ok(entries)
    }
}

/// Turn a salvaged `{chapter, name}` item into an entry
///
/// Returns `None` for items without a chapter, shallower than `level`, or
/// with an empty name. A name that repeats its chapter number loses it.
pub fn catalog_entry(candidate: &RequirementCandidate, level: usize) -> Option<CatalogEntry> {
    let chapter = candidate
        .chapter_number
        .as_deref()?
        .trim()
        .trim_end_matches('.');
    if chapter_depth(chapter) < level {
        return None;
    }

    let name = candidate.title.trim();
    let name = name
        .strip_prefix(chapter)
        .map(|rest| rest.trim_start_matches('.').trim())
        .unwrap_or(name);
    if name.is_empty() {
        return None;
    }

    Some(CatalogEntry::new(chapter, name))
}
