//! Salvage structured data from unreliable free-text replies
//!
//! The generation service is asked for JSON but its output format is not
//! guaranteed. [`salvage`] runs a cascade of increasingly permissive
//! strategies and stops at the first one that yields a non-empty value:
//!
//! 1. fenced code block
//! 2. balanced-brace objects (one nesting level) carrying a list key
//! 3. the array after a list key, re-wrapped into an object
//! 4. item-shaped fragments assembled into a list
//! 5. everything between the first `{` and the last `}`
//!
//! When all five fail, `(number, title)` pairs and heading-shaped lines are
//! pattern-matched out of the raw text. If even that finds nothing, a
//! sentinel object carrying the start of the text is returned. Malformed
//! input never produces an error.

use regex::Regex;
use reqsift_domain::RequirementCandidate;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// List keys accepted in a reply (`chapters` is the regression dialect)
pub const LIST_KEYS: &[&str] = &["requirements", "chapters"];

/// Key of the single-object reply to a named search
pub const SINGLE_KEY: &str = "requirement";

/// Characters of the raw reply kept in the sentinel object
const SENTINEL_TEXT_CHARS: usize = 1000;

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.+?)```").expect("valid fenced block regex")
});
static BALANCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("valid balanced object regex")
});
static ITEM_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{\s*"chapter_number"[^{}]+?\}"#).expect("valid item fragment regex")
});
static CHAPTER_THEN_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"chapter_number"\s*:\s*"([^"]+)"\s*,\s*"title"\s*:\s*"([^"]+)""#)
        .expect("valid chapter/title regex")
});
static TITLE_THEN_CHAPTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"title"\s*:\s*"([^"]+)"\s*,\s*"chapter_number"\s*:\s*"([^"]+)""#)
        .expect("valid title/chapter regex")
});
static REQ_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bREQ-\d+\.\d+\b").expect("valid identifier regex"));
static DEEP_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\d+\.\d+[ \t]+([^\n]+)").expect("valid deep heading regex")
});
static SHALLOW_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+[ \t]+([^\n]+)").expect("valid heading regex"));

/// Which step of the cascade produced a [`Salvaged`] value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalvageStrategy {
    /// Fenced code block
    FencedBlock,
    /// Balanced-brace object containing a list key
    BalancedObject,
    /// Inner array after a list key
    ListLiteral,
    /// Item-shaped fragments assembled into a list
    ItemFragments,
    /// Outermost braces
    OuterBraces,
    /// `(number, title)` pairs or headings matched out of the raw text
    Manual,
    /// Nothing recoverable; the value is a sentinel failure object
    Sentinel,
}

/// Result of salvaging one reply
#[derive(Debug, Clone, PartialEq)]
pub struct Salvaged {
    /// The recovered object (or the sentinel)
    pub value: Value,
    /// Strategy that produced it
    pub strategy: SalvageStrategy,
}

impl Salvaged {
    /// True when nothing could be recovered
    pub fn is_failure(&self) -> bool {
        self.strategy == SalvageStrategy::Sentinel
    }

    /// Candidates under any of the list keys
    pub fn candidates(&self) -> Vec<RequirementCandidate> {
        candidates_from(&self.value, LIST_KEYS)
    }

    /// The single `requirement` object of a named-search reply, falling back
    /// to the first listed item
    pub fn single_candidate(&self) -> Option<RequirementCandidate> {
        match self.value.get(SINGLE_KEY) {
            Some(item) if item.is_object() => parse_item(item),
            _ => self.candidates().into_iter().next(),
        }
    }
}

/// Salvage a structured object from `raw`; never fails
///
/// # Examples
///
/// ```
/// use reqsift_extractor::salvage::{salvage, SalvageStrategy};
///
/// let reply = "Sure!\n```json\n{\"requirements\": []}\n```";
/// let salvaged = salvage(reply);
/// assert_eq!(salvaged.strategy, SalvageStrategy::FencedBlock);
///
/// let prose = salvage("I could not find anything useful here.");
/// assert!(prose.is_failure());
/// ```
pub fn salvage(raw: &str) -> Salvaged {
    let steps: [(SalvageStrategy, fn(&str) -> Option<Value>); 5] = [
        (SalvageStrategy::FencedBlock, from_fenced_block),
        (SalvageStrategy::BalancedObject, from_balanced_objects),
        (SalvageStrategy::ListLiteral, from_list_literal),
        (SalvageStrategy::ItemFragments, from_item_fragments),
        (SalvageStrategy::OuterBraces, from_outer_braces),
    ];

    for (strategy, step) in steps {
        if let Some(value) = step(raw).filter(is_non_empty) {
            if strategy != SalvageStrategy::FencedBlock {
                debug!("Reply salvaged with {:?}", strategy);
            }
            return Salvaged { value, strategy };
        }
    }

    if let Some(value) = manual_extraction(raw) {
        warn!("All JSON strategies failed; recovered items from headings");
        return Salvaged {
            value,
            strategy: SalvageStrategy::Manual,
        };
    }

    warn!("No structured data in reply ({} chars)", raw.chars().count());
    Salvaged {
        value: json!({
            "error": "Failed to parse JSON",
            "text": raw.chars().take(SENTINEL_TEXT_CHARS).collect::<String>(),
        }),
        strategy: SalvageStrategy::Sentinel,
    }
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn has_expected_key(value: &Value) -> bool {
    LIST_KEYS
        .iter()
        .chain(std::iter::once(&SINGLE_KEY))
        .any(|key| value.get(*key).is_some())
}

fn from_fenced_block(raw: &str) -> Option<Value> {
    let caps = FENCED.captures(raw)?;
    serde_json::from_str(caps.get(1)?.as_str().trim()).ok()
}

fn from_balanced_objects(raw: &str) -> Option<Value> {
    BALANCED
        .find_iter(raw)
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .find(has_expected_key)
}

fn from_list_literal(raw: &str) -> Option<Value> {
    LIST_KEYS.iter().find_map(|key| {
        let pattern = format!(r#"(?s)"{}"\s*:\s*\[(.*?)\]"#, key);
        let re = Regex::new(&pattern).ok()?;
        let inner = re.captures(raw)?.get(1)?.as_str().trim();
        let wrapped = format!(r#"{{"{}": [{}]}}"#, key, inner);
        serde_json::from_str(&wrapped).ok()
    })
}

fn from_item_fragments(raw: &str) -> Option<Value> {
    let items: Vec<Value> = ITEM_FRAGMENT
        .find_iter(raw)
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(|item| item.get("title").is_some())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(json!({ "requirements": items }))
    }
}

fn from_outer_braces(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn manual_item(title: &str, chapter: &str, identifier: &str) -> Value {
    json!({
        "title": title,
        "chapter_number": chapter,
        "identifier": identifier,
        "content": format!("标识号: {}\n\n需求: {}", identifier, title),
    })
}

fn manual_extraction(raw: &str) -> Option<Value> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for caps in CHAPTER_THEN_TITLE.captures_iter(raw) {
        pairs.push((caps[2].to_string(), caps[1].to_string()));
    }
    for caps in TITLE_THEN_CHAPTER.captures_iter(raw) {
        pairs.push((caps[1].to_string(), caps[2].to_string()));
    }

    let identifiers: Vec<&str> = REQ_ID.find_iter(raw).map(|m| m.as_str()).collect();

    let mut items = Vec::new();
    if !pairs.is_empty() {
        for (i, (title, chapter)) in pairs.iter().enumerate() {
            let identifier = identifiers
                .get(i)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("REQ-{}.1", i + 1));
            items.push(manual_item(title, chapter, &identifier));
        }
    } else {
        let mut seen = std::collections::HashSet::new();
        let headings = DEEP_HEADING
            .captures_iter(raw)
            .chain(SHALLOW_HEADING.captures_iter(raw))
            .map(|caps| caps[1].trim().to_string())
            .filter(|title| !title.is_empty() && seen.insert(title.clone()))
            .collect::<Vec<_>>();
        for (i, title) in headings.iter().enumerate() {
            let chapter = format!("3.{}", i + 1);
            let identifier = format!("REQ-{}.1", i + 1);
            items.push(manual_item(title, &chapter, &identifier));
        }
    }

    if items.is_empty() {
        None
    } else {
        Some(json!({ "requirements": items }))
    }
}

/// Turn the list under the first present key into candidates.
///
/// A single object where a list was expected is treated as a one-item list.
/// Items that are not objects are skipped; a missing title becomes an empty
/// string so callers can decide how to name it.
pub fn candidates_from(value: &Value, keys: &[&str]) -> Vec<RequirementCandidate> {
    let Some(list) = keys.iter().find_map(|key| value.get(*key)) else {
        return Vec::new();
    };
    match list {
        Value::Array(items) => items.iter().filter_map(parse_item).collect(),
        Value::Object(_) => parse_item(list).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn parse_item(item: &Value) -> Option<RequirementCandidate> {
    let obj = item.as_object()?;
    Some(RequirementCandidate {
        title: text_field(obj, &["title", "name"]).unwrap_or_default(),
        chapter_number: text_field(obj, &["chapter_number", "chapter"]),
        identifier: text_field(obj, &["identifier"]),
        content: obj.get("content").map(content_text).unwrap_or_default(),
    })
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Content may come back as a nested object; keep it readable as text
fn content_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_wins_over_stray_braces() {
        let reply = r#"Here is {"requirements": [{"title": "Stray"}]} and the answer:
```json
{"requirements": [{"chapter_number": "3.2.1", "title": "Login", "content": "The user logs in."}]}
```"#;
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::FencedBlock);
        let candidates = salvaged.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Login");
        assert_eq!(candidates[0].chapter_number.as_deref(), Some("3.2.1"));
    }

    #[test]
    fn test_unlabelled_fence() {
        let reply = "```\n{\"chapters\": [{\"title\": \"A\", \"content\": \"body\"}]}\n```";
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::FencedBlock);
        assert_eq!(salvaged.candidates()[0].title, "A");
    }

    #[test]
    fn test_broken_fence_falls_through_to_balanced_object() {
        let reply = r#"```json
{"requirements": [ oops
```
Retry: {"requirements": [{"title": "Export", "content": "Export data"}]}"#;
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::BalancedObject);
        assert_eq!(salvaged.candidates()[0].title, "Export");
    }

    #[test]
    fn test_balanced_object_requires_list_key() {
        let reply = r#"{"note": "ignore"} then {"requirements": [{"title": "B"}]}"#;
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::BalancedObject);
        assert_eq!(salvaged.candidates()[0].title, "B");
    }

    #[test]
    fn test_list_literal_rewrapped() {
        // Two levels of nesting defeat the balanced-object scan.
        let reply = r#"result: {"data": {"requirements": [{"title": "Deep", "content": "x"}], "meta": {"a": {"b": 1}}}"#;
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::ListLiteral);
        assert_eq!(salvaged.candidates()[0].title, "Deep");
    }

    #[test]
    fn test_item_fragments_assembled() {
        let reply = r#"{"requirements": [
  {"chapter_number": "3.1.1", "title": "Alpha", "content": "first"},
  {"chapter_number": "3.1.2", "title": "Beta", "content": "second"},
  {"chapter_number": "3.1.3", "title": "Gam"#;
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::ItemFragments);
        let titles: Vec<_> = salvaged.candidates().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_outer_braces_last_resort() {
        let reply = r#"Answer: {"requirement": {"title": "X", "content": {"a": {"b": {"c": 1}}}}} done"#;
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::OuterBraces);
        let single = salvaged.single_candidate().unwrap();
        assert_eq!(single.title, "X");
        assert!(single.content.contains("\"c\": 1"));
    }

    #[test]
    fn test_manual_pairs_from_malformed_json() {
        let reply = r#"{"requirements": [{"chapter_number": "3.2.1", "title": "Login", "identifier": "REQ-7.1", "content": "unterminated"#;
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::Manual);
        let candidates = salvaged.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Login");
        assert_eq!(candidates[0].identifier.as_deref(), Some("REQ-7.1"));
        assert_eq!(candidates[0].content, "标识号: REQ-7.1\n\n需求: Login");
    }

    #[test]
    fn test_manual_headings_from_plain_text() {
        let reply = "I found these:\n3.2.1 User login\n3.2.2 User logout\n";
        let salvaged = salvage(reply);
        assert_eq!(salvaged.strategy, SalvageStrategy::Manual);
        let candidates = salvaged.candidates();
        assert_eq!(candidates[0].title, "User login");
        assert_eq!(candidates[0].chapter_number.as_deref(), Some("3.1"));
        assert_eq!(candidates[0].identifier.as_deref(), Some("REQ-1.1"));
        assert!(candidates.iter().any(|c| c.title == "User logout"));
    }

    #[test]
    fn test_prose_yields_sentinel() {
        let reply = "Sorry, I cannot help with that request.";
        let salvaged = salvage(reply);
        assert!(salvaged.is_failure());
        assert_eq!(salvaged.value["error"], "Failed to parse JSON");
        assert_eq!(salvaged.value["text"], reply);
        assert!(salvaged.candidates().is_empty());
    }

    #[test]
    fn test_sentinel_text_is_truncated() {
        let reply = "no structure ".repeat(200);
        let salvaged = salvage(&reply);
        let text = salvaged.value["text"].as_str().unwrap();
        assert_eq!(text.chars().count(), SENTINEL_TEXT_CHARS);
    }

    #[test]
    fn test_empty_object_is_not_a_result() {
        let salvaged = salvage("```json\n{}\n```");
        assert!(salvaged.is_failure());
    }

    #[test]
    fn test_single_object_where_list_expected() {
        let value = json!({"requirements": {"title": "Solo", "content": "body text"}});
        let candidates = candidates_from(&value, LIST_KEYS);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Solo");
    }

    #[test]
    fn test_empty_fields_become_none() {
        let value = json!({"requirements": [{"title": "T", "identifier": "", "chapter_number": "  ", "content": "c"}]});
        let candidate = &candidates_from(&value, LIST_KEYS)[0];
        assert_eq!(candidate.identifier, None);
        assert_eq!(candidate.chapter_number, None);
    }

    #[test]
    fn test_single_candidate_null_requirement() {
        let salvaged = salvage(r#"{"requirement": null, "reason": "absent"}"#);
        assert!(salvaged.single_candidate().is_none());
    }
}
