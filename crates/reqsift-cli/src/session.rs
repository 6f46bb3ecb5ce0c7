//! Sessions persisted as JSON files, so a later invocation can rematch.

use crate::error::{CliError, Result};
use reqsift_domain::traits::SessionStore;
use reqsift_domain::{ExtractionSession, RequirementRecord, SessionId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Serialized form of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Requirement title
    pub title: String,
    /// Section number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    /// Requirement identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Body text
    pub content: String,
}

impl From<&RequirementRecord> for StoredRecord {
    fn from(record: &RequirementRecord) -> Self {
        Self {
            title: record.title.clone(),
            chapter: record.chapter.clone(),
            identifier: record.identifier.clone(),
            content: record.content.clone(),
        }
    }
}

impl From<StoredRecord> for RequirementRecord {
    fn from(stored: StoredRecord) -> Self {
        Self {
            title: stored.title,
            chapter: stored.chapter,
            identifier: stored.identifier,
            content: stored.content,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredSession {
    file_reference: String,
    requirements: Vec<StoredRecord>,
}

/// One JSON file per session under a directory.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Store sessions under `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save `session` under a fresh id and return the id.
    pub fn save(&self, session: &ExtractionSession) -> Result<String> {
        let id = SessionId::new().to_string();
        self.write(&id, session)?;
        Ok(id)
    }

    /// Read the session stored under `key`.
    pub fn read(&self, key: &str) -> Result<ExtractionSession> {
        let path = self.path_for(key)?;
        let contents = fs::read_to_string(&path)
            .map_err(|e| CliError::Session(format!("Session '{}' not found: {}", key, e)))?;
        let stored: StoredSession = serde_json::from_str(&contents)?;
        Ok(ExtractionSession::new(
            stored.file_reference,
            stored.requirements.into_iter().map(Into::into).collect(),
        ))
    }

    /// Write `session` under `key`, replacing any previous one.
    pub fn write(&self, key: &str, session: &ExtractionSession) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let stored = StoredSession {
            file_reference: session.file_reference.clone(),
            requirements: session.requirements.iter().map(StoredRecord::from).collect(),
        };
        fs::write(path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys become file names; only session ids are accepted.
        SessionId::from_string(key).map_err(CliError::Session)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<ExtractionSession> {
        self.read(key).ok()
    }

    fn put(&self, key: String, session: ExtractionSession) {
        if let Err(e) = self.write(&key, &session) {
            warn!("Failed to store session {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> RequirementRecord {
        RequirementRecord {
            title: title.to_string(),
            chapter: Some("3.2.1".to_string()),
            identifier: None,
            content: format!("{} body", title),
        }
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions"));
        let session = ExtractionSession::new("spec.txt", vec![record("Login"), record("Export")]);

        let id = store.save(&session).unwrap();
        assert_eq!(store.read(&id).unwrap(), session);
        assert_eq!(store.get(&id), Some(session));
    }

    #[test]
    fn test_put_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        let id = SessionId::new().to_string();

        store.put(id.clone(), ExtractionSession::new("a.txt", vec![record("A")]));
        store.put(id.clone(), ExtractionSession::new("a.txt", vec![record("A"), record("B")]));

        assert_eq!(store.get(&id).unwrap().requirements.len(), 2);
    }

    #[test]
    fn test_unknown_or_malformed_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        assert!(store.get(&SessionId::new().to_string()).is_none());
        assert!(matches!(store.read("../config"), Err(CliError::Session(_))));
    }
}
