//! Chunk - a bounded window of document paragraphs

use std::ops::Range;

/// A window of consecutive paragraphs sent to the generation service in one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Paragraph text joined with newlines
    pub text: String,

    /// Estimated cost of `text` in model units
    pub unit_count: usize,

    /// Paragraph indices covered, `[start, end)`
    pub source_range: Range<usize>,

    /// Most recent "section number + heading" seen in this window
    pub last_marker: Option<String>,
}

impl Chunk {
    /// Number of paragraphs in this chunk
    pub fn paragraph_count(&self) -> usize {
        self.source_range.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_count() {
        let chunk = Chunk {
            text: "a\nb".into(),
            unit_count: 2,
            source_range: 3..5,
            last_marker: None,
        };
        assert_eq!(chunk.paragraph_count(), 2);
    }
}
