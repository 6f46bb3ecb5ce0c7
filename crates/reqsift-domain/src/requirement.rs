//! Requirement candidates and the ordered record accumulator

use std::collections::HashMap;

/// One requirement item salvaged from a single chunk's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementCandidate {
    /// Requirement title (the record key)
    pub title: String,

    /// Section number, e.g. "3.2.1"
    pub chapter_number: Option<String>,

    /// Requirement identifier, e.g. "REQ-1.1"
    pub identifier: Option<String>,

    /// Full body text
    pub content: String,
}

impl RequirementCandidate {
    /// Create a candidate with only a title and content
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            chapter_number: None,
            identifier: None,
            content: content.into(),
        }
    }

    /// True when the trimmed content is longer than `min_chars` characters
    pub fn has_content(&self, min_chars: usize) -> bool {
        self.content.trim().chars().count() > min_chars
    }
}

/// An accumulated requirement, keyed by title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementRecord {
    /// Requirement title
    pub title: String,

    /// Section number, if known
    pub chapter: Option<String>,

    /// Requirement identifier, if known
    pub identifier: Option<String>,

    /// Merged body text
    pub content: String,
}

impl From<RequirementCandidate> for RequirementRecord {
    fn from(candidate: RequirementCandidate) -> Self {
        Self {
            title: candidate.title,
            chapter: candidate.chapter_number,
            identifier: candidate.identifier,
            content: candidate.content,
        }
    }
}

/// What [`RecordSet::upsert_with`] did with a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First sighting of the title; a new record was appended
    Inserted,
    /// Title already present; content was merged into the existing record
    Merged,
}

/// Records keyed by title, iterated in first-seen order.
///
/// Records are created on first sighting and mutated in place afterwards;
/// nothing is ever removed during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<RequirementRecord>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate, or merge it into the record with the same title.
    ///
    /// `merge` receives the existing content and the new content and returns
    /// the combined body. Missing chapter/identifier fields on the existing
    /// record are filled from the candidate; present ones are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use reqsift_domain::{RecordSet, RequirementCandidate, UpsertOutcome};
    ///
    /// let mut set = RecordSet::new();
    /// let first = set.upsert_with(RequirementCandidate::new("Login", "part one"), |a, b| format!("{a}+{b}"));
    /// let second = set.upsert_with(RequirementCandidate::new("Login", "part two"), |a, b| format!("{a}+{b}"));
    /// assert_eq!(first, UpsertOutcome::Inserted);
    /// assert_eq!(second, UpsertOutcome::Merged);
    /// assert_eq!(set.get("Login").unwrap().content, "part one+part two");
    /// ```
    pub fn upsert_with<F>(&mut self, candidate: RequirementCandidate, merge: F) -> UpsertOutcome
    where
        F: FnOnce(&str, &str) -> String,
    {
        match self.index.get(&candidate.title) {
            Some(&pos) => {
                let existing = &mut self.records[pos];
                existing.content = merge(&existing.content, &candidate.content);
                if existing.chapter.is_none() {
                    existing.chapter = candidate.chapter_number;
                }
                if existing.identifier.is_none() {
                    existing.identifier = candidate.identifier;
                }
                UpsertOutcome::Merged
            }
            None => {
                self.push(candidate.into());
                UpsertOutcome::Inserted
            }
        }
    }

    /// Append a record if its title is not present yet.
    ///
    /// Returns false (and leaves the set untouched) for a known title.
    pub fn insert_new(&mut self, record: RequirementRecord) -> bool {
        if self.index.contains_key(&record.title) {
            return false;
        }
        self.push(record);
        true
    }

    fn push(&mut self, record: RequirementRecord) {
        self.index.insert(record.title.clone(), self.records.len());
        self.records.push(record);
    }

    /// Look up a record by title
    pub fn get(&self, title: &str) -> Option<&RequirementRecord> {
        self.index.get(title).map(|&pos| &self.records[pos])
    }

    /// True when a record with this title exists
    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recently inserted record
    pub fn last(&self) -> Option<&RequirementRecord> {
        self.records.last()
    }

    /// Iterate records in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &RequirementRecord> {
        self.records.iter()
    }

    /// Consume the set, returning records in first-seen order
    pub fn into_vec(self) -> Vec<RequirementRecord> {
        self.records
    }
}

impl FromIterator<RequirementRecord> for RecordSet {
    /// Later records with an already-seen title are dropped
    fn from_iter<T: IntoIterator<Item = RequirementRecord>>(iter: T) -> Self {
        let mut set = RecordSet::new();
        for record in iter {
            set.insert_new(record);
        }
        set
    }
}
