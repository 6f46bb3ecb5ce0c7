//! Requirement identifier lookup

use regex::Regex;
use std::sync::LazyLock;

static REQ_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"REQ-\d+\.\d+").expect("valid identifier regex"));

static LABELLED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:标识号|identifier)\s*[：:]\s*(\S+)").expect("valid label regex")
});

/// Label written in front of an identifier when content lacks one
pub const IDENTIFIER_LABEL: &str = "标识号";

/// Find a requirement identifier in `text`.
///
/// `REQ-<n>.<n>` wins; otherwise the token after an identifier label.
///
/// # Examples
///
/// ```
/// use reqsift_extractor::identifier::extract_identifier;
///
/// assert_eq!(extract_identifier("a) 标识号: REQ-2.4 b) ..."), Some("REQ-2.4".to_string()));
/// assert_eq!(extract_identifier("标识号：SRS-LOGIN"), Some("SRS-LOGIN".to_string()));
/// assert_eq!(extract_identifier("no id here"), None);
/// ```
pub fn extract_identifier(text: &str) -> Option<String> {
    if let Some(m) = REQ_PATTERN.find(text) {
        return Some(m.as_str().to_string());
    }
    LABELLED_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Prefix `content` with an identifier line unless the identifier already
/// appears in it.
pub fn with_identifier_prefix(content: &str, identifier: &str) -> String {
    if content.contains(identifier) {
        content.to_string()
    } else {
        format!("{}: {}\n{}", IDENTIFIER_LABEL, identifier, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_req_pattern_preferred_over_label() {
        let text = "标识号: SRS-9\n关联: REQ-3.1";
        assert_eq!(extract_identifier(text), Some("REQ-3.1".to_string()));
    }

    #[test]
    fn test_english_label() {
        assert_eq!(
            extract_identifier("Identifier: LOGIN-01\nDescription"),
            Some("LOGIN-01".to_string())
        );
    }

    #[test]
    fn test_prefix_added_once() {
        let prefixed = with_identifier_prefix("login body", "REQ-1.1");
        assert_eq!(prefixed, "标识号: REQ-1.1\nlogin body");
        assert_eq!(with_identifier_prefix(&prefixed, "REQ-1.1"), prefixed);
    }
}
