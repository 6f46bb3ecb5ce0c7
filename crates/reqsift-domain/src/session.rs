//! Extraction sessions - the last known result of a run, kept for rematching

use crate::requirement::RequirementRecord;
use std::fmt;

/// Opaque session identifier based on UUIDv7
///
/// UUIDv7 keeps identifiers sortable by creation time, so a listing of
/// stored sessions reads oldest-first without extra metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u128);

impl SessionId {
    /// Generate a new UUIDv7-based SessionId
    ///
    /// # Examples
    ///
    /// ```
    /// use reqsift_domain::SessionId;
    ///
    /// let id = SessionId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a SessionId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a SessionId from its hyphenated string form
    ///
    /// # Examples
    ///
    /// ```
    /// use reqsift_domain::SessionId;
    ///
    /// let id = SessionId::new();
    /// let parsed = SessionId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid session id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Last known result of an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSession {
    /// Records matched so far, in first-seen order
    pub requirements: Vec<RequirementRecord>,

    /// Reference to the source file (path or upload key)
    pub file_reference: String,
}

impl ExtractionSession {
    /// Create a session for a file with the given records
    pub fn new(file_reference: impl Into<String>, requirements: Vec<RequirementRecord>) -> Self {
        Self {
            requirements,
            file_reference: file_reference.into(),
        }
    }

    /// Content of the last matched record, the rematch anchor
    pub fn last_content(&self) -> Option<&str> {
        self.requirements.last().map(|r| r.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::RequirementCandidate;

    #[test]
    fn test_session_id_display_length() {
        let id = SessionId::new();
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn test_session_id_chronological() {
        let id1 = SessionId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = SessionId::new();
        assert!(id1 < id2);
    }

    #[test]
    fn test_session_id_invalid_string() {
        assert!(SessionId::from_string("not-a-session").is_err());
        assert!(SessionId::from_string("").is_err());
    }

    #[test]
    fn test_last_content() {
        let empty = ExtractionSession::default();
        assert_eq!(empty.last_content(), None);

        let session = ExtractionSession::new(
            "spec.docx",
            vec![
                RequirementCandidate::new("A", "first").into(),
                RequirementCandidate::new("B", "second").into(),
            ],
        );
        assert_eq!(session.last_content(), Some("second"));
    }
}
