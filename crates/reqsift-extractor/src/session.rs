//! In-memory session store

use reqsift_domain::traits::SessionStore;
use reqsift_domain::ExtractionSession;
use std::collections::HashMap;
use std::sync::Mutex;

/// Sessions kept in a process-local map
///
/// Suits a single long-running process; use a persistent store when a later
/// invocation has to find the session.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, ExtractionSession>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// True when no session is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<ExtractionSession> {
        // A poisoned lock still holds usable data.
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(key).cloned()
    }

    fn put(&self, key: String, session: ExtractionSession) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(key, session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqsift_domain::{RequirementCandidate, SessionId};

    #[test]
    fn test_put_then_get() {
        let store = MemorySessionStore::new();
        let id = SessionId::new().to_string();
        let session = ExtractionSession::new(
            "spec.docx",
            vec![RequirementCandidate::new("Login", "login body").into()],
        );

        store.put(id.clone(), session.clone());
        assert_eq!(store.get(&id), Some(session));
        assert_eq!(store.len(), 1);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_put_replaces() {
        let store = MemorySessionStore::new();
        store.put("k".into(), ExtractionSession::new("a.docx", vec![]));
        store.put("k".into(), ExtractionSession::new("b.docx", vec![]));
        assert_eq!(store.get("k").unwrap().file_reference, "b.docx");
    }
}
