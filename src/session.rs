//! Session state and the session-scoped cache
//!
//! [`SessionState`] is process-local: the current DID, the authentication
//! state and the selected course. Each slot has one writer. The auth slot is
//! written only by [`crate::credentials::CredentialAuthority`]; the selection
//! slot only by [`crate::platform::Platform::select_course`].
//!
//! [`SessionCache`] models browser session storage. Clones share the same
//! entries, so a cache can outlive the `SessionState` that filled it.

use crate::credentials::{AuthState, InstructorCredential};
use crate::identity::Did;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct SessionState {
    did: Did,
    auth: AuthState,
    selected_course: Option<String>,
}

impl SessionState {
    pub fn new(did: Did) -> Self {
        Self {
            did,
            auth: AuthState::default(),
            selected_course: None,
        }
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Active credential; `None` means logged out
    pub fn credential(&self) -> Option<&InstructorCredential> {
        self.auth.credential()
    }

    pub fn is_logged_in(&self) -> bool {
        self.credential().is_some()
    }

    pub fn selected_course(&self) -> Option<&str> {
        self.selected_course.as_deref()
    }

    pub(crate) fn set_auth(&mut self, auth: AuthState) {
        self.auth = auth;
    }

    pub(crate) fn set_selected_course(&mut self, course_id: Option<String>) {
        self.selected_course = course_id;
    }
}

/// String key/value store scoped to a browsing session
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) {
        self.entries.write().await.insert(key.to_string(), value.into());
    }

    pub async fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().await.remove(key)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::KeyStore;

    #[tokio::test]
    async fn test_cache_clones_share_entries() {
        let cache = SessionCache::new();
        let other = cache.clone();
        cache.set("instructorCredential", "jwt").await;
        assert_eq!(other.get("instructorCredential").await.as_deref(), Some("jwt"));

        assert_eq!(other.remove("instructorCredential").await.as_deref(), Some("jwt"));
        assert!(cache.get("instructorCredential").await.is_none());
    }

    #[test]
    fn test_new_session_is_logged_out() {
        let mut keys = KeyStore::new();
        let mut session = SessionState::new(keys.generate());
        assert!(!session.is_logged_in());
        assert!(matches!(session.auth(), AuthState::LoggedOut { message: None }));

        session.set_selected_course(Some("c1".into()));
        assert_eq!(session.selected_course(), Some("c1"));
        session.set_selected_course(None);
        assert!(session.selected_course().is_none());
    }
}
