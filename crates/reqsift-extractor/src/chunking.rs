//! Paragraph chunking for large documents
//!
//! Three strategies, all over an ordered paragraph list:
//!
//! - [`chunk_by_budget`]: greedy packing, no overlap
//! - [`chunk_with_overlap`]: sliding windows that repeat trailing paragraphs
//!   and record the last section marker of each window
//! - [`chunk_by_chars`]: character-budgeted windows for catalog extraction
//!
//! Every strategy covers `[0, len)` without gaps and always makes progress,
//! even when a single paragraph exceeds the budget on its own.

use crate::tokenizer::UnitEstimator;
use regex::Regex;
use reqsift_domain::Chunk;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

/// Section number with at least three parts followed by heading text
static MARKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(\d+\.\d+\.\d+(?:\.\d+)*)\s+\S").expect("valid section marker regex")
});

/// Most recent "section number + heading" line in `paragraphs`, scanning backward
pub fn find_last_marker<S: AsRef<str>>(paragraphs: &[S]) -> Option<String> {
    paragraphs.iter().rev().find_map(|para| {
        let para = para.as_ref();
        let caps = MARKER_PATTERN.captures(para)?;
        let start = caps.get(1)?.start();
        let rest = &para[start..];
        let line = rest.split('\n').next().unwrap_or(rest);
        Some(line.trim().to_string())
    })
}

fn build_chunk<S: AsRef<str>>(
    paragraphs: &[S],
    range: Range<usize>,
    estimator: &dyn UnitEstimator,
    with_marker: bool,
) -> Chunk {
    let slice = &paragraphs[range.clone()];
    let text = slice
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    let unit_count = estimator.estimate(&text);
    let last_marker = if with_marker {
        find_last_marker(slice)
    } else {
        None
    };
    Chunk {
        text,
        unit_count,
        source_range: range,
        last_marker,
    }
}

/// Greedily pack paragraphs into chunks of at most `max_units`.
///
/// A paragraph that alone exceeds the budget becomes its own chunk.
pub fn chunk_by_budget<S: AsRef<str>>(
    paragraphs: &[S],
    max_units: usize,
    estimator: &dyn UnitEstimator,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut current_units = 0;

    for (idx, para) in paragraphs.iter().enumerate() {
        let units = estimator.estimate(para.as_ref());
        if current_units + units > max_units && idx > start {
            chunks.push(build_chunk(paragraphs, start..idx, estimator, false));
            start = idx;
            current_units = 0;
        }
        current_units += units;
    }

    if start < paragraphs.len() {
        chunks.push(build_chunk(paragraphs, start..paragraphs.len(), estimator, false));
    }

    debug!("Budget chunking: {} chunks, budget {}", chunks.len(), max_units);
    chunks
}

/// Slide a window of `window_units` over the paragraphs, repeating roughly
/// `overlap_units` worth of paragraphs between consecutive windows.
///
/// Each chunk's `last_marker` is the last section heading found in it.
///
/// # Examples
///
/// ```
/// use reqsift_extractor::chunking::chunk_with_overlap;
/// use reqsift_extractor::tokenizer::CharEstimator;
///
/// let paras = vec!["3.1.1 Alpha", "aaaa", "3.1.2 Beta", "bbbb"];
/// let chunks = chunk_with_overlap(&paras, 20, 5, &CharEstimator);
/// assert_eq!(chunks[0].source_range.start, 0);
/// assert_eq!(chunks.last().unwrap().source_range.end, 4);
/// ```
pub fn chunk_with_overlap<S: AsRef<str>>(
    paragraphs: &[S],
    window_units: usize,
    overlap_units: usize,
    estimator: &dyn UnitEstimator,
) -> Vec<Chunk> {
    let units: Vec<usize> = paragraphs
        .iter()
        .map(|p| estimator.estimate(p.as_ref()))
        .collect();
    let total = paragraphs.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = start;
        let mut size = 0;
        while end < total && size + units[end] <= window_units {
            size += units[end];
            end += 1;
        }
        if end == start {
            end = start + 1;
        }

        chunks.push(build_chunk(paragraphs, start..end, estimator, true));

        if end >= total {
            break;
        }

        // Paragraphs from the window start needed to reach the overlap budget.
        let mut overlap_count = 0;
        let mut overlap_size = 0;
        while start + overlap_count < end && overlap_size < overlap_units {
            overlap_size += units[start + overlap_count];
            overlap_count += 1;
        }

        start = (start + 1).max(end.saturating_sub(overlap_count.max(1)));
    }

    debug!(
        "Sliding window chunking: {} chunks, window {}, overlap {}",
        chunks.len(),
        window_units,
        overlap_units
    );
    chunks
}

/// Character-budgeted chunking with paragraph overlap.
///
/// When adding a paragraph would exceed `max_chars`, the current chunk is
/// closed and the next one is seeded with the paragraphs from the point
/// where the closed chunk had reached `max_chars - overlap_chars`.
pub fn chunk_by_chars<S: AsRef<str>>(
    paragraphs: &[S],
    max_chars: usize,
    overlap_chars: usize,
) -> Vec<Chunk> {
    let char_len = |i: usize| paragraphs[i].as_ref().chars().count();
    let estimator = crate::tokenizer::CharEstimator;
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut length = 0;
    let mut overlap_start: Option<usize> = None;

    for idx in 0..paragraphs.len() {
        let para_len = char_len(idx);

        if length + para_len > max_chars && idx > start {
            chunks.push(build_chunk(paragraphs, start..idx, &estimator, false));

            start = match overlap_start {
                Some(seed) if overlap_chars > 0 && seed > start => seed,
                _ => idx,
            };
            length = (start..idx).map(char_len).sum();
            // A seed that cannot take the next paragraph would repeat itself forever.
            if length + para_len > max_chars {
                start = idx;
                length = 0;
            }
            overlap_start = None;
        }

        length += para_len;

        if overlap_start.is_none() && length >= max_chars.saturating_sub(overlap_chars) {
            overlap_start = Some(idx);
        }
    }

    if start < paragraphs.len() {
        chunks.push(build_chunk(paragraphs, start..paragraphs.len(), &estimator, false));
    }

    debug!(
        "Character chunking: {} chunks, max {} chars, overlap {}",
        chunks.len(),
        max_chars,
        overlap_chars
    );
    chunks
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::tokenizer::CharEstimator;
    use proptest::prelude::*;

    fn make(sizes: &[usize]) -> Vec<String> {
        sizes.iter().map(|&n| "x".repeat(n)).collect()
    }

    fn assert_covers(chunks: &[Chunk], total: usize) -> Result<(), TestCaseError> {
        if total == 0 {
            prop_assert!(chunks.is_empty());
            return Ok(());
        }
        prop_assert_eq!(chunks[0].source_range.start, 0);
        prop_assert_eq!(chunks[chunks.len() - 1].source_range.end, total);
        for pair in chunks.windows(2) {
            // No gap, and the start strictly advances.
            prop_assert!(pair[1].source_range.start <= pair[0].source_range.end);
            prop_assert!(pair[1].source_range.start > pair[0].source_range.start);
        }
        for chunk in chunks {
            prop_assert!(!chunk.source_range.is_empty());
        }
        Ok(())
    }

    proptest! {
        /// Property: sliding windows cover every paragraph and always advance
        #[test]
        fn test_overlap_coverage_and_progress(
            sizes in prop::collection::vec(1usize..40, 0..60),
            window in 1usize..100,
            overlap in 0usize..100,
        ) {
            let p = make(&sizes);
            let chunks = chunk_with_overlap(&p, window, overlap, &CharEstimator);
            assert_covers(&chunks, p.len())?;
            prop_assert!(chunks.len() <= p.len());
        }

        /// Property: budget chunks partition the paragraphs exactly
        #[test]
        fn test_budget_partition(
            sizes in prop::collection::vec(1usize..40, 0..60),
            budget in 1usize..100,
        ) {
            let p = make(&sizes);
            let chunks = chunk_by_budget(&p, budget, &CharEstimator);
            assert_covers(&chunks, p.len())?;
            for pair in chunks.windows(2) {
                prop_assert_eq!(pair[1].source_range.start, pair[0].source_range.end);
            }
        }

        /// Property: character chunks cover every paragraph and always advance
        #[test]
        fn test_chars_coverage(
            sizes in prop::collection::vec(1usize..40, 0..60),
            max in 1usize..120,
            overlap in 0usize..120,
        ) {
            let p = make(&sizes);
            let chunks = chunk_by_chars(&p, max, overlap);
            assert_covers(&chunks, p.len())?;
        }
    }
}
