//! Session identity backed by the session-lifetime storage area.

use std::sync::{Arc, RwLock};

use parley_core::id::generate_session_id;
use parley_core::storage::StorageArea;
use parley_core::storage::keys::SESSION_KEY;

/// Resolves and remembers the active session id.
///
/// The id is read from the session-lifetime area on first use, generated if
/// absent, and written back. When the area cannot be read or written the id
/// lives only in this process.
pub struct SessionIdentity {
    area: Arc<dyn StorageArea>,
    cached: RwLock<Option<String>>,
}

impl SessionIdentity {
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self {
            area,
            cached: RwLock::new(None),
        }
    }

    /// Returns the active session id, creating it on first call.
    pub fn current_session_id(&self) -> String {
        if let Ok(guard) = self.cached.read() {
            if let Some(id) = guard.as_ref() {
                return id.clone();
            }
        }

        let id = match self.area.get_item(SESSION_KEY) {
            Ok(Some(existing)) if !existing.is_empty() => existing,
            Ok(_) => {
                let generated = generate_session_id();
                self.persist(&generated);
                tracing::info!("[Session] Started new session {}", generated);
                generated
            }
            Err(e) => {
                let generated = generate_session_id();
                tracing::warn!(
                    "[Session] Session area unreadable ({}), keeping {} in memory only",
                    e,
                    generated
                );
                generated
            }
        };

        self.remember(&id);
        id
    }

    /// Replaces the active session id and writes it through.
    pub fn set_session_id(&self, session_id: &str) {
        self.persist(session_id);
        self.remember(session_id);
        tracing::info!("[Session] Switched to session {}", session_id);
    }

    fn persist(&self, session_id: &str) {
        if let Err(e) = self.area.set_item(SESSION_KEY, session_id) {
            tracing::warn!(
                "[Session] Failed to persist session id ({}), keeping it in memory only",
                e
            );
        }
    }

    fn remember(&self, session_id: &str) {
        if let Ok(mut guard) = self.cached.write() {
            *guard = Some(session_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorageArea;
    use parley_core::storage::StorageAreaError;

    /// Area that fails every operation.
    struct BrokenArea;

    impl StorageArea for BrokenArea {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageAreaError> {
            Err(StorageAreaError::unavailable("disabled"))
        }
        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageAreaError> {
            Err(StorageAreaError::unavailable("disabled"))
        }
        fn remove_item(&self, _key: &str) -> Result<(), StorageAreaError> {
            Err(StorageAreaError::unavailable("disabled"))
        }
        fn keys(&self) -> Result<Vec<String>, StorageAreaError> {
            Err(StorageAreaError::unavailable("disabled"))
        }
        fn replace_namespace(
            &self,
            _prefix: &str,
            _entries: Vec<(String, String)>,
        ) -> Result<(), StorageAreaError> {
            Err(StorageAreaError::unavailable("disabled"))
        }
    }

    #[test]
    fn test_generates_and_persists_once() {
        let area = Arc::new(MemoryStorageArea::new());
        let identity = SessionIdentity::new(area.clone());

        let first = identity.current_session_id();
        assert!(first.starts_with("session_"));
        assert_eq!(identity.current_session_id(), first);
        assert_eq!(area.get_item(SESSION_KEY).unwrap(), Some(first.clone()));

        // A second identity over the same area sees the same session
        let again = SessionIdentity::new(area);
        assert_eq!(again.current_session_id(), first);
    }

    #[test]
    fn test_reuses_existing_id() {
        let area = Arc::new(MemoryStorageArea::new());
        area.set_item(SESSION_KEY, "session_42_abc").unwrap();

        let identity = SessionIdentity::new(area);
        assert_eq!(identity.current_session_id(), "session_42_abc");
    }

    #[test]
    fn test_degraded_mode_keeps_id_in_memory() {
        let identity = SessionIdentity::new(Arc::new(BrokenArea));
        let id = identity.current_session_id();
        assert_eq!(identity.current_session_id(), id);
    }

    #[test]
    fn test_set_session_id_writes_through() {
        let area = Arc::new(MemoryStorageArea::new());
        let identity = SessionIdentity::new(area.clone());
        identity.current_session_id();

        identity.set_session_id("session_7_xyz");

        assert_eq!(identity.current_session_id(), "session_7_xyz");
        assert_eq!(
            area.get_item(SESSION_KEY).unwrap(),
            Some("session_7_xyz".to_string())
        );
    }
}
