//! Table of contents parsing without a generation service

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Dot leaders and a trailing page number: "..........12"
static DOT_LEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.…·]{3,}\s*\d*\s*$").expect("valid dot leader regex"));

/// "3.2.1 用户登录 12", page number optional
static TOC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*\.?)\s+(\D.*?)(?:\s+\d+)?$").expect("valid toc line regex")
});

/// One entry of a table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Section number, e.g. "3.2.1"
    pub chapter: String,

    /// Section number and title, e.g. "3.2.1 用户登录"
    pub name: String,

    /// Nesting depth of the section number
    pub level: usize,
}

/// Parse table of contents lines into leaf entries
///
/// Lines without a leading section number are ignored, and an entry is
/// dropped when a later entry is nested under it: only the deepest sections
/// name requirements.
///
/// ```
/// use reqsift_heuristic::parse_catalog_entries;
///
/// let lines = ["3.2 功能需求 ........ 10", "3.2.1 用户登录 ........ 11", "3.2.2 数据导出 12"];
/// let entries = parse_catalog_entries(&lines);
/// let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
/// assert_eq!(names, vec!["3.2.1 用户登录", "3.2.2 数据导出"]);
/// ```
pub fn parse_catalog_entries<S: AsRef<str>>(lines: &[S]) -> Vec<TocEntry> {
    let mut entries: Vec<TocEntry> = Vec::new();

    for line in lines {
        let cleaned = DOT_LEADER.replace(line.as_ref().trim(), "");
        let Some(caps) = TOC_LINE.captures(cleaned.trim()) else {
            continue;
        };
        let chapter = caps[1].trim_end_matches('.').to_string();
        let title = caps[2].trim();
        if title.is_empty() || entries.iter().any(|e| e.chapter == chapter) {
            continue;
        }
        entries.push(TocEntry {
            level: chapter.split('.').count(),
            name: format!("{} {}", chapter, title),
            chapter,
        });
    }

    let parents: Vec<String> = entries
        .iter()
        .filter(|e| {
            entries
                .iter()
                .any(|other| other.chapter.starts_with(&format!("{}.", e.chapter)))
        })
        .map(|e| e.chapter.clone())
        .collect();
    entries.retain(|e| !parents.contains(&e.chapter));

    debug!("Parsed {} leaf catalog entries", entries.len());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_dot_leaders_and_page_numbers() {
        let entries = parse_catalog_entries(&["3.2.1. 用户登录……………15", "3.2.2 数据导出 16"]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].chapter, "3.2.1");
        assert_eq!(entries[0].name, "3.2.1 用户登录");
        assert_eq!(entries[1].name, "3.2.2 数据导出");
        assert_eq!(entries[1].level, 3);
    }

    #[test]
    fn test_parent_entries_removed() {
        let entries = parse_catalog_entries(&["3 需求", "3.1 概述", "3.2 功能需求", "3.2.1 登录", "4 附录"]);
        let chapters: Vec<_> = entries.iter().map(|e| e.chapter.as_str()).collect();
        assert_eq!(chapters, vec!["3.1", "3.2.1", "4"]);
    }

    #[test]
    fn test_parent_prefix_needs_dot() {
        let entries = parse_catalog_entries(&["3.1 概述", "3.10 附加"]);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_ignores_non_entries() {
        let entries = parse_catalog_entries(&["目录", "", "第一章 引言", "版本 1.0"]);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let entries = parse_catalog_entries(&["3.2.1 登录 5", "3.2.1 登录（续） 6"]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "3.2.1 登录");
    }
}
