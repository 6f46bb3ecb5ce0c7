//! Requirement boundary extraction without a generation service

use crate::{HeuristicConfig, HeuristicError};
use regex::Regex;
use reqsift_domain::{Document, Table};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Multi-level section heading: "3.2.1 Login", "3.2.1. 用户登录"
static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d+)+\.?\s+[A-Za-z\p{Han}]").expect("valid section heading regex")
});

/// Numbered step inside a processing part: "1.", "12."
static NUMBERED_STEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\d*\.").expect("valid numbered step regex"));

/// Section number at the start of a requirement name
static NAME_CHAPTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d.]+)\s+").expect("valid name chapter regex"));

/// How a title was found, tried in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// The whole name, whitespace removed, appears in a paragraph
    Exact,
    /// A paragraph starts with the name's section number
    ChapterNumber,
    /// The name without its section number appears in a paragraph
    Name,
}

/// Content located for one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Requirement block, title first, paragraphs joined by newlines
    pub content: String,

    /// Layout index of the title paragraph
    pub paragraph_index: usize,

    /// Tier that matched the title
    pub tier: MatchTier,

    /// Canonical names of the structural parts seen
    pub parts_found: Vec<String>,

    /// Validity terms appeared right after the title
    pub confirmed: bool,

    /// Tables appended to the content
    pub tables_attached: usize,

    /// Lines kept without matching any known shape
    pub unclassified_lines: usize,
}

/// Result of locating one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateOutcome {
    /// The title was found and its block passed the validity gate
    Found(Located),

    /// The title was found but no candidate block passed the validity gate
    NoContent {
        /// Layout index of the first matching paragraph
        paragraph_index: usize,
        /// Tier that matched
        tier: MatchTier,
    },

    /// No paragraph matched the name
    NotFound,
}

impl LocateOutcome {
    /// The located content, if any
    pub fn content(&self) -> Option<&str> {
        match self {
            LocateOutcome::Found(located) => Some(&located.content),
            _ => None,
        }
    }

    /// True when content was located
    pub fn is_found(&self) -> bool {
        matches!(self, LocateOutcome::Found(_))
    }
}

/// Why a candidate block was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    /// Short, unconfirmed and unstructured
    TooShort,
    /// Fewer parts than required
    TooFewParts,
}

/// Extracts a requirement's content given its title, using layout cues only
pub struct BoundaryExtractor {
    config: HeuristicConfig,
    identifier: Regex,
    validity_terms: Vec<String>,
}

impl BoundaryExtractor {
    /// Create a new extractor with the given configuration
    pub fn new(config: HeuristicConfig) -> Result<Self, HeuristicError> {
        config.validate()?;

        let labels: Vec<String> = config
            .keywords
            .identifier_labels
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| regex::escape(l.trim()))
            .collect();
        let identifier = Regex::new(&format!(r"(?i)(?:{})\s*[：:]\s*([\w.\-]+)", labels.join("|")))?;
        let validity_terms = config.keywords.validity_terms();

        Ok(Self {
            config,
            identifier,
            validity_terms,
        })
    }

    /// Create an extractor with the default configuration
    pub fn default_config() -> Result<Self, HeuristicError> {
        Self::new(HeuristicConfig::default())
    }

    /// The active configuration
    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Locate the content of the requirement called `name`
    ///
    /// Titles are matched in three tiers: the whole name, then its section
    /// number, then the name without the number. A later tier is only tried
    /// when the earlier one matched no paragraph at all.
    pub fn locate(&self, document: &Document, name: &str) -> LocateOutcome {
        let layout = document.layout();
        let limit = layout.len().min(self.config.thresholds.search_limit);

        let name_compact = strip_whitespace(name);
        if name_compact.is_empty() {
            return LocateOutcome::NotFound;
        }
        let (chapter, bare_name) = split_chapter(name);
        let bare_compact = strip_whitespace(bare_name);

        let mut tiers = vec![MatchTier::Exact];
        if let Some(chapter) = chapter {
            tiers.push(MatchTier::ChapterNumber);
            if bare_name.chars().count() > self.config.thresholds.min_name_chars {
                tiers.push(MatchTier::Name);
            }
            debug!("Name '{}' split into chapter {} and '{}'", name, chapter, bare_name);
        }

        for tier in tiers {
            let mut first_hit = None;
            for (idx, text) in layout[..limit].iter().enumerate() {
                let hit = match tier {
                    MatchTier::Exact => strip_whitespace(text).contains(&name_compact),
                    MatchTier::ChapterNumber => chapter.is_some_and(|c| starts_with_chapter(text, c)),
                    MatchTier::Name => strip_whitespace(text).contains(&bare_compact),
                };
                if !hit {
                    continue;
                }
                first_hit.get_or_insert(idx);
                debug!("'{}' matched paragraph {} ({:?})", name, idx, tier);

                match self.extract_block(document, idx, name, tier) {
                    Ok(located) => return LocateOutcome::Found(located),
                    Err(reason) => debug!("Paragraph {} rejected: {:?}", idx, reason),
                }
            }

            if let Some(paragraph_index) = first_hit {
                warn!("'{}' found but no valid content", name);
                return LocateOutcome::NoContent {
                    paragraph_index,
                    tier,
                };
            }
        }

        warn!("'{}' not found in the first {} paragraphs", name, limit);
        LocateOutcome::NotFound
    }

    /// Decide the content span for a title already found at `paragraph_index`
    ///
    /// `paragraph_index` is a position in [`Document::layout`]. Returns `None`
    /// when the block fails the validity gate.
    pub fn extract_at(&self, document: &Document, paragraph_index: usize, name: &str) -> Option<Located> {
        if paragraph_index >= document.layout().len() {
            return None;
        }
        self.extract_block(document, paragraph_index, name, MatchTier::Exact).ok()
    }

    /// Locate many names on a bounded pool of worker threads
    ///
    /// Results come back in the order of `names`.
    pub fn locate_many(
        &self,
        document: &Document,
        names: &[String],
    ) -> Result<Vec<(String, LocateOutcome)>, HeuristicError> {
        let workers = self.config.workers.clamp(1, names.len().max(1));
        info!("Locating {} names with {} workers", names.len(), workers);

        let next = AtomicUsize::new(0);
        let next = &next;
        let joined = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let idx = next.fetch_add(1, Ordering::Relaxed);
                            let Some(name) = names.get(idx) else {
                                break;
                            };
                            done.push((idx, self.locate(document, name)));
                        }
                        done
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
        });

        let mut outcomes: Vec<Option<LocateOutcome>> = vec![None; names.len()];
        for result in joined {
            let done = result.map_err(|_| HeuristicError::Worker("locator thread panicked".into()))?;
            for (idx, outcome) in done {
                outcomes[idx] = Some(outcome);
            }
        }

        let found = outcomes.iter().flatten().filter(|o| o.is_found()).count();
        info!("Located {}/{} names", found, names.len());

        Ok(names
            .iter()
            .cloned()
            .zip(outcomes.into_iter().map(|o| o.unwrap_or(LocateOutcome::NotFound)))
            .collect())
    }

    /// Decide the content span for a title at `start`
    fn extract_block(
        &self,
        document: &Document,
        start: usize,
        name: &str,
        tier: MatchTier,
    ) -> Result<Located, Rejection> {
        let layout = document.layout();
        let total = layout.len();
        let t = &self.config.thresholds;

        // 1. Confirm validity
        let confirmed = layout[start + 1..]
            .iter()
            .take(t.validity_scan)
            .any(|text| self.has_validity_term(&text.to_lowercase()));

        // 2. Pre-scan for the next requirement heading
        let next_start = self.find_next_boundary(layout, start, name);
        let search_limit = match next_start {
            Some(next) => next - start - 1,
            None => t.min_search_range.max(t.fallback_window).min(total - start - 1),
        };
        debug!(
            "'{}': next boundary {:?}, searching {} paragraphs",
            name, next_start, search_limit
        );

        // 3. Collect content
        let mut block = vec![layout[start].clone()];
        let mut parts: BTreeSet<usize> = BTreeSet::new();
        let mut unclassified = 0;
        let mut i = 1;

        while i <= search_limit && start + i < total {
            let text = layout[start + i].trim();
            let lower = text.to_lowercase();

            if i > t.heading_guard_lines
                && SECTION_HEADING.is_match(text)
                && text.chars().count() < t.heading_max_chars
                && !self.is_excluded_heading(&lower)
            {
                debug!("'{}' ends at heading {}: {}", name, start + i, text);
                break;
            }

            let part = self.lettered_part(&lower).or_else(|| self.labelled_part(text, &lower));
            if let Some(idx) = part {
                parts.insert(idx);
            }
            let continuation = NUMBERED_STEP.is_match(text)
                || text.starts_with('-')
                || text.is_empty()
                || i < t.early_lines;
            let shaped = part.is_some() || continuation;

            if !shaped {
                debug!("Paragraph {} kept without a known shape: {}", start + i, text);
                unclassified += 1;
            }
            block.push(text.to_string());
            i += 1;

            if (shaped || confirmed) && i > t.early_stop_lines && self.all_markers_present(&block) {
                debug!("'{}' has every lettered part", name);
                break;
            }
        }
        let end = start + i;

        // 4. Cross-requirement cleanup
        let mut block = self.trim_foreign_identifiers(block, name);

        // 5. Table augmentation
        let mut tables_attached = 0;
        for table in document.tables() {
            if self.is_relevant_table(layout, table, name, start, end) {
                if let Some(rendered) = self.render_table(table) {
                    block.push(rendered);
                    tables_attached += 1;
                }
            }
        }

        // 6. Validity gate
        let content = block.join("\n");
        let content_chars = content.chars().count();
        if content_chars < t.min_content_chars && !confirmed && parts.len() < t.min_parts {
            debug!("'{}' content too short ({} chars) and unstructured", name, content_chars);
            return Err(Rejection::TooShort);
        }
        if t.require_min_parts && parts.len() < t.min_parts {
            debug!("'{}' has {} of {} required parts", name, parts.len(), t.min_parts);
            return Err(Rejection::TooFewParts);
        }

        let parts_found: Vec<String> = parts
            .iter()
            .map(|&idx| self.config.keywords.parts[idx].name.clone())
            .collect();
        let missing: Vec<&str> = self
            .config
            .keywords
            .parts
            .iter()
            .filter(|p| !parts_found.contains(&p.name))
            .map(|p| p.name.as_str())
            .collect();
        if !missing.is_empty() {
            debug!("'{}' missing parts: {}", name, missing.join(", "));
        }

        Ok(Located {
            content,
            paragraph_index: start,
            tier,
            parts_found,
            confirmed,
            tables_attached,
            unclassified_lines: unclassified,
        })
    }

    fn find_next_boundary(&self, layout: &[String], start: usize, name: &str) -> Option<usize> {
        let t = &self.config.thresholds;
        let own_prefix = name.split_whitespace().next().unwrap_or(name);
        let end = (start + t.prescan_window).min(layout.len());

        for i in start + 1..end {
            let text = layout[i].trim();
            let lower = text.to_lowercase();

            let looks_like_boundary = text.starts_with("---")
                || (SECTION_HEADING.is_match(text)
                    && text.chars().count() < t.boundary_max_chars
                    && !text.starts_with(own_prefix)
                    && !self.is_excluded_heading(&lower)
                    && self
                        .config
                        .keywords
                        .boundary_keywords
                        .iter()
                        .any(|k| lower.contains(&k.to_lowercase())));
            if !looks_like_boundary {
                continue;
            }

            if i > start + t.boundary_guard_lines && self.is_open_enumeration(&layout[i - 1]) {
                continue;
            }
            return Some(i);
        }
        None
    }

    fn is_open_enumeration(&self, previous: &str) -> bool {
        let prev = previous.trim().to_lowercase();
        let keywords = &self.config.keywords;
        keywords.enumeration_markers.iter().any(|m| prev.starts_with(&m.to_lowercase()))
            || keywords.enumeration_terms.iter().any(|t| prev.contains(&t.to_lowercase()))
            || prev.ends_with(':')
            || prev.ends_with('：')
    }

    fn has_validity_term(&self, lower: &str) -> bool {
        self.validity_terms.iter().any(|term| lower.contains(term.as_str()))
    }

    fn is_excluded_heading(&self, lower: &str) -> bool {
        self.config
            .keywords
            .excluded_heading_keywords
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()))
    }

    /// Index of the part whose lettered marker opens the line
    fn lettered_part(&self, lower: &str) -> Option<usize> {
        let normalized = normalize_marker(lower);
        self.config
            .keywords
            .parts
            .iter()
            .position(|p| normalized.starts_with(&p.marker.to_lowercase()))
    }

    /// Index of the part whose label (followed closely by a colon) is on the line
    fn labelled_part(&self, text: &str, lower: &str) -> Option<usize> {
        let t = &self.config.thresholds;
        let colon = lower.chars().position(|c| c == ':' || c == '：');
        let short = text.chars().count() < t.label_max_chars;

        self.config.keywords.parts.iter().position(|part| {
            part.variants.iter().any(|variant| {
                let variant = variant.to_lowercase();
                (lower.starts_with(&variant) || (short && lower.contains(&variant)))
                    && colon.is_some_and(|c| c < t.colon_window)
            })
        })
    }

    fn all_markers_present(&self, block: &[String]) -> bool {
        self.config.keywords.parts.iter().all(|part| {
            let marker = part.marker.to_lowercase();
            block
                .iter()
                .any(|line| normalize_marker(&line.to_lowercase()).starts_with(&marker))
        })
    }

    fn is_relevant_table(&self, layout: &[String], table: &Table, name: &str, start: usize, end: usize) -> bool {
        let name_compact = strip_whitespace(name);
        let references = |text: &str| {
            strip_whitespace(text).contains(&name_compact) || self.has_validity_term(&text.to_lowercase())
        };

        let header = table.first_row_text();
        let header_matches = references(&header);

        match table.position {
            // Positioned tables belong to the block they sit in.
            Some(pos) => {
                if pos <= start || pos > end {
                    return false;
                }
                let after_blank = pos >= 2 && layout[pos - 1].is_empty() && references(&layout[pos - 2]);
                after_blank || header_matches
            }
            None => header_matches,
        }
    }

    fn render_table(&self, table: &Table) -> Option<String> {
        let rows: Vec<String> = table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.trim())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .filter(|row| !row.replace('|', "").trim().is_empty())
            .collect();
        if rows.is_empty() {
            return None;
        }
        Some(format!("{}\n{}", self.config.keywords.table_label, rows.join("\n")))
    }

    /// Drop everything from the first line carrying a different identifier
    fn trim_foreign_identifiers(&self, block: Vec<String>, name: &str) -> Vec<String> {
        let scan = self.config.thresholds.identifier_scan_lines;
        let Some(own) = block.iter().take(scan).find_map(|line| self.identifier_of(line)) else {
            return block;
        };

        let cut = block
            .iter()
            .position(|line| self.identifier_of(line).is_some_and(|id| id != own))
            .map(|cut| {
                // The heading right above a foreign identifier opens that requirement.
                if cut > 1 && SECTION_HEADING.is_match(block[cut - 1].trim()) {
                    cut - 1
                } else {
                    cut
                }
            });
        match cut {
            Some(cut) => {
                debug!(
                    "'{}' ({}) trimmed {} lines belonging to another requirement",
                    name,
                    own,
                    block.len() - cut
                );
                block.into_iter().take(cut).collect()
            }
            None => block,
        }
    }

    fn identifier_of(&self, line: &str) -> Option<String> {
        self.identifier
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Split "3.2.1 用户登录" into ("3.2.1", "用户登录")
fn split_chapter(name: &str) -> (Option<&str>, &str) {
    match NAME_CHAPTER.captures(name).and_then(|caps| caps.get(1)) {
        Some(m) => (Some(m.as_str()), name[m.end()..].trim()),
        None => (None, name.trim()),
    }
}

/// True when `text` opens with `chapter` and not with a longer number
fn starts_with_chapter(text: &str, chapter: &str) -> bool {
    let chapter = chapter.trim_end_matches('.');
    let Some(rest) = text.trim().strip_prefix(chapter) else {
        return false;
    };
    let mut chars = rest.chars();
    match chars.next() {
        None => true,
        Some(c) if c.is_ascii_digit() => false,
        Some('.') => !chars.next().is_some_and(|c| c.is_ascii_digit()),
        Some(_) => true,
    }
}

/// Treat a full-width closing parenthesis like an ASCII one in markers
fn normalize_marker(lower: &str) -> String {
    lower.chars().take(4).map(|c| if c == '）' { ')' } else { c }).collect()
}
