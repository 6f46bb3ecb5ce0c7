//! Boundary extractor configuration
//!
//! Everything dialect-specific lives in [`KeywordTable`]; the numeric limits
//! live in [`Thresholds`]. The defaults describe Chinese software
//! requirements specifications with lettered parts `a)`..`h)`, with English
//! synonyms added.

use crate::HeuristicError;
use serde::{Deserialize, Serialize};

/// One structural part of a requirement, e.g. `c) 进入条件`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartKeywords {
    /// Canonical part name
    pub name: String,

    /// Lettered marker that opens the part, e.g. `a)`
    pub marker: String,

    /// Terms whose presence near a title confirms a real requirement
    pub terms: Vec<String>,

    /// Labels recognized as `label: ...` lines for this part
    pub variants: Vec<String>,
}

impl PartKeywords {
    fn new(name: &str, marker: &str, terms: &[&str], variants: &[&str]) -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            name: name.to_string(),
            marker: marker.to_string(),
            terms: owned(terms),
            variants: owned(variants),
        }
    }
}

/// Keywords and markers of one document dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTable {
    /// Words a new requirement heading is expected to contain
    pub boundary_keywords: Vec<String>,

    /// Headings containing these are sub-headers, never a new requirement
    pub excluded_heading_keywords: Vec<String>,

    /// A previous line starting with one of these is an open enumeration
    pub enumeration_markers: Vec<String>,

    /// A previous line containing one of these is an open enumeration
    pub enumeration_terms: Vec<String>,

    /// Labels written before a requirement identifier
    pub identifier_labels: Vec<String>,

    /// Line written before appended table rows
    pub table_label: String,

    /// Structural parts, in marker order
    pub parts: Vec<PartKeywords>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            boundary_keywords: owned(&["功能", "特性", "模块", "function", "feature", "module"]),
            excluded_heading_keywords: owned(&[
                "性能",
                "约束",
                "限制",
                "响应时间",
                "performance",
                "constraint",
            ]),
            enumeration_markers: owned(&["f)", "-"]),
            enumeration_terms: owned(&["处理", "processing"]),
            identifier_labels: owned(&["标识号", "identifier"]),
            table_label: "需求相关表格:".to_string(),
            parts: vec![
                PartKeywords::new(
                    "标识号",
                    "a)",
                    &["标识号", "identifier"],
                    &["标识号", "编号", "id", "需求编号", "req-", "identifier"],
                ),
                PartKeywords::new(
                    "说明",
                    "b)",
                    &["说明", "description"],
                    &["说明", "描述", "功能描述", "概述", "简介", "description"],
                ),
                PartKeywords::new(
                    "进入条件",
                    "c)",
                    &["进入条件", "entry condition"],
                    &["进入条件", "前置条件", "触发条件", "条件", "precondition", "entry condition"],
                ),
                PartKeywords::new("输入", "d)", &["输入", "input"], &["输入", "输入参数", "输入数据", "input"]),
                PartKeywords::new(
                    "输出",
                    "e)",
                    &["输出", "output"],
                    &["输出", "输出参数", "输出数据", "返回值", "output"],
                ),
                PartKeywords::new(
                    "处理",
                    "f)",
                    &["处理", "processing"],
                    &["处理", "处理过程", "处理逻辑", "实现过程", "步骤", "processing"],
                ),
                PartKeywords::new(
                    "性能",
                    "g)",
                    &["性能", "performance"],
                    &["性能", "性能要求", "性能指标", "性能参数", "响应时间", "performance"],
                ),
                PartKeywords::new(
                    "约束",
                    "h)",
                    &["约束", "constraint"],
                    &["约束", "约束条件", "约束与限制", "约束和限制", "限制", "要求", "constraint"],
                ),
            ],
        }
    }
}

impl KeywordTable {
    /// All validity terms, lowercased
    pub fn validity_terms(&self) -> Vec<String> {
        self.parts
            .iter()
            .flat_map(|p| p.terms.iter())
            .map(|t| t.to_lowercase())
            .collect()
    }
}

/// Numeric limits of the boundary search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Paragraphs after the title scanned for validity terms
    pub validity_scan: usize,

    /// Paragraphs scanned ahead for the next requirement heading
    pub prescan_window: usize,

    /// Paragraphs searched at least when no next heading was found
    pub min_search_range: usize,

    /// Paragraphs searched when no next heading was found
    pub fallback_window: usize,

    /// Lines right after the title that are always accepted
    pub early_lines: usize,

    /// A part label's colon must appear within this many characters
    pub colon_window: usize,

    /// Only the first paragraphs are searched for titles
    pub search_limit: usize,

    /// Content shorter than this needs structure to be kept
    pub min_content_chars: usize,

    /// Parts needed to count as structured
    pub min_parts: usize,

    /// With every part seen, stop after this many lines
    pub early_stop_lines: usize,

    /// A heading only ends collection after this many lines
    pub heading_guard_lines: usize,

    /// The previous-line check applies after this many lines
    pub boundary_guard_lines: usize,

    /// Longest line accepted as a next-requirement heading
    pub boundary_max_chars: usize,

    /// Longest line treated as a section heading during collection
    pub heading_max_chars: usize,

    /// Longest line in which a label may appear anywhere
    pub label_max_chars: usize,

    /// A name without its section number must be longer than this to be
    /// matched on its own
    pub min_name_chars: usize,

    /// Lines at the top of a block searched for its identifier
    pub identifier_scan_lines: usize,

    /// Reject content with fewer than `min_parts` parts regardless of length
    pub require_min_parts: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            validity_scan: 15,
            prescan_window: 200,
            min_search_range: 30,
            fallback_window: 100,
            early_lines: 8,
            colon_window: 30,
            search_limit: 1000,
            min_content_chars: 50,
            min_parts: 4,
            early_stop_lines: 20,
            heading_guard_lines: 10,
            boundary_guard_lines: 5,
            boundary_max_chars: 80,
            heading_max_chars: 100,
            label_max_chars: 150,
            min_name_chars: 5,
            identifier_scan_lines: 10,
            require_min_parts: true,
        }
    }
}

/// Configuration for the boundary extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Worker threads used when locating many names
    pub workers: usize,

    /// Numeric limits
    pub thresholds: Thresholds,

    /// Dialect keywords
    pub keywords: KeywordTable,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            thresholds: Thresholds::default(),
            keywords: KeywordTable::default(),
        }
    }
}

impl HeuristicConfig {
    /// Accept short or loosely structured requirements
    pub fn permissive() -> Self {
        Self {
            thresholds: Thresholds {
                min_parts: 2,
                require_min_parts: false,
                ..Thresholds::default()
            },
            ..Self::default()
        }
    }

    /// Require every kept requirement to show most of its parts
    pub fn strict() -> Self {
        Self {
            thresholds: Thresholds {
                min_parts: 6,
                min_content_chars: 100,
                ..Thresholds::default()
            },
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), HeuristicError> {
        let t = &self.thresholds;
        if self.workers == 0 {
            return Err(HeuristicError::Config("workers must be at least 1".into()));
        }
        if t.search_limit == 0 || t.prescan_window == 0 {
            return Err(HeuristicError::Config(
                "search_limit and prescan_window must be greater than 0".into(),
            ));
        }
        if self.keywords.parts.is_empty() {
            return Err(HeuristicError::Config("keyword table has no parts".into()));
        }
        if self.keywords.parts.iter().any(|p| p.marker.is_empty()) {
            return Err(HeuristicError::Config("every part needs a marker".into()));
        }
        if self.keywords.identifier_labels.iter().all(|l| l.trim().is_empty()) {
            return Err(HeuristicError::Config("at least one identifier label is required".into()));
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, HeuristicError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| HeuristicError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, HeuristicError> {
        toml::to_string_pretty(self).map_err(|e| HeuristicError::Config(e.to_string()))
    }
}
