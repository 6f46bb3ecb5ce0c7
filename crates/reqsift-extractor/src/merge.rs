//! Overlap-aware merging of requirement fragments
//!
//! Adjacent windows often return the same requirement twice, or return its
//! tail with a few sentences repeated. Fragments are stitched together by
//! dropping literal duplicates and splicing at the longest suffix/prefix
//! overlap within a bounded search window. This is an approximate,
//! bounded-cost deduplication, not a diff.

/// Separator used when two fragments share no usable overlap
pub const SEPARATOR: &str = "\n\n";

/// Tuning for [`merge_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Shortest overlap (in characters) accepted as a splice point
    pub min_overlap: usize,
    /// Characters examined at the end of the accumulated text and the start
    /// of the next fragment
    pub max_overlap: usize,
    /// Stop once the merged text exceeds this many characters, truncating it
    pub max_length: Option<usize>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            min_overlap: 10,
            max_overlap: 200,
            max_length: None,
        }
    }
}

/// Merge fragments with the default overlap window
///
/// # Examples
///
/// ```
/// use reqsift_extractor::merge::merge_fragments;
///
/// assert_eq!(merge_fragments(&["same", "same"], None), "same");
/// assert_eq!(merge_fragments(&["one", "two"], None), "one\n\ntwo");
/// ```
pub fn merge_fragments<S: AsRef<str>>(fragments: &[S], max_length: Option<usize>) -> String {
    merge_with(
        fragments,
        &MergeOptions {
            max_length,
            ..MergeOptions::default()
        },
    )
}

/// Merge fragments in order using `options`
pub fn merge_with<S: AsRef<str>>(fragments: &[S], options: &MergeOptions) -> String {
    let Some((first, rest)) = fragments.split_first() else {
        return String::new();
    };

    let mut merged = first.as_ref().to_string();
    for fragment in rest {
        let fragment = fragment.as_ref();
        if merged.contains(fragment) {
            continue;
        }

        let overlap = find_overlap(&merged, fragment, options.min_overlap, options.max_overlap);
        if overlap > 0 {
            merged.extend(fragment.chars().skip(overlap));
        } else {
            merged.push_str(SEPARATOR);
            merged.push_str(fragment);
        }

        if let Some(max) = options.max_length {
            if merged.chars().count() > max {
                merged = merged.chars().take(max).collect();
                break;
            }
        }
    }
    merged
}

/// Merge two bodies with the default options
pub fn merge_pair(existing: &str, incoming: &str) -> String {
    merge_fragments(&[existing, incoming], None)
}

/// Length in characters of the longest suffix of `s1` that is also a prefix
/// of `s2`, searching at most `max_overlap` characters of each.
///
/// Returns 0 when no overlap of at least `min_overlap` characters exists.
pub fn find_overlap(s1: &str, s2: &str, min_overlap: usize, max_overlap: usize) -> usize {
    let tail: Vec<char> = {
        let chars: Vec<char> = s1.chars().collect();
        let from = chars.len().saturating_sub(max_overlap);
        chars[from..].to_vec()
    };
    let head: Vec<char> = s2.chars().take(max_overlap).collect();

    let limit = tail.len().min(head.len());
    let min_overlap = min_overlap.max(1);
    (min_overlap..=limit)
        .rev()
        .find(|&len| tail[tail.len() - len..] == head[..len])
        .unwrap_or(0)
}
