//! Export, import and clear flows with user feedback.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parley_core::error::{ParleyError, Result};
use parley_core::notify::{ConfirmRequest, Confirmer, Notification, Notifier};
use parley_core::storage::{AdminStore, ImportResult};
use parley_infrastructure::ParleyPaths;

/// Runs the data-management flows and reports each outcome through the
/// [`Notifier`].
pub struct DataManagementService {
    store: Arc<dyn AdminStore>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
}

impl DataManagementService {
    pub fn new(
        store: Arc<dyn AdminStore>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            store,
            notifier,
            confirmer,
        }
    }

    /// Writes today's backup (`parley-backup-YYYY-MM-DD.json`) into `dir`.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(ParleyPaths::backup_file_name(Utc::now().date_naive()));
        self.export_to_file(&path)?;
        Ok(path)
    }

    /// Writes the export bundle of the active session to `path`.
    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        let result = self.write_export(path);
        match &result {
            Ok(()) => {
                tracing::info!("[Data] Exported to {}", path.display());
                self.notifier.notify(Notification::success("Data exported"));
            }
            Err(e) => {
                tracing::error!("[Data] Export failed: {}", e);
                self.notifier.notify(Notification::error("Export failed"));
            }
        }
        result
    }

    fn write_export(&self, path: &Path) -> Result<()> {
        let json = self
            .store
            .export_data()
            .ok_or_else(|| ParleyError::storage("storage could not be read"))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, json)?;
        Ok(())
    }

    /// Reads a bundle from `path` and imports it, replacing all stored data.
    pub fn import_from_file(&self, path: &Path) -> ImportResult {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("[Data] Cannot read {}: {}", path.display(), e);
                self.notifier
                    .notify(Notification::error("File could not be read"));
                return ImportResult::failed(e.to_string());
            }
        };

        let result = self.store.import_data(&content);
        match &result {
            ImportResult::Imported(summary) => self.notifier.notify(Notification::success(
                format!("Imported {} items", summary.item_count),
            )),
            ImportResult::Failed { error } => self
                .notifier
                .notify(Notification::error(format!("Import failed: {}", error))),
        }
        result
    }

    /// Asks for confirmation, then deletes every stored key of every session.
    ///
    /// Returns true if data was cleared.
    pub async fn clear_all(&self) -> bool {
        let request = ConfirmRequest {
            title: "Clear all data".to_string(),
            message: "Delete all stored data? This cannot be undone.".to_string(),
            confirm_label: "Clear all data".to_string(),
            cancel_label: "Cancel".to_string(),
        };
        if !self.confirmer.confirm(request).await {
            tracing::debug!("[Data] Clear cancelled");
            return false;
        }

        if self.store.clear() {
            self.notifier
                .notify(Notification::success("All data cleared"));
            true
        } else {
            self.notifier
                .notify(Notification::error("Failed to clear data"));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::notify::NotificationLevel;
    use parley_core::storage::SessionScopedStore;
    use parley_infrastructure::{KvStore, MemoryStorageArea};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn last(&self) -> Notification {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }

    struct FixedConfirmer {
        answer: bool,
        asked: Mutex<Vec<ConfirmRequest>>,
    }

    #[async_trait]
    impl Confirmer for FixedConfirmer {
        async fn confirm(&self, request: ConfirmRequest) -> bool {
            self.asked.lock().unwrap().push(request);
            self.answer
        }
    }

    fn setup(answer: bool) -> (Arc<KvStore>, Arc<RecordingNotifier>, Arc<FixedConfirmer>, DataManagementService) {
        let store = Arc::new(KvStore::new(
            Arc::new(MemoryStorageArea::new()),
            Arc::new(MemoryStorageArea::new()),
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let confirmer = Arc::new(FixedConfirmer {
            answer,
            asked: Mutex::new(Vec::new()),
        });
        let service = DataManagementService::new(store.clone(), notifier.clone(), confirmer.clone());
        (store, notifier, confirmer, service)
    }

    #[test]
    fn test_export_then_import() {
        let temp_dir = TempDir::new().unwrap();
        let (store, notifier, _, service) = setup(true);
        store.set("theme", "dark");
        store.set("settings", r#"{"autoSave":false}"#);

        let path = service.export_to_dir(temp_dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("parley-backup-"));
        assert!(name.ends_with(".json"));
        assert_eq!(notifier.last().level, NotificationLevel::Success);

        store.clear();
        let result = service.import_from_file(&path);

        assert_eq!(result.item_count(), Some(2));
        assert_eq!(notifier.last().message, "Imported 2 items");
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_import_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let (store, notifier, _, service) = setup(true);
        store.set("theme", "dark");

        let path = temp_dir.path().join("bad.json");
        fs::write(&path, r#"{"data":{}}"#).unwrap();

        let result = service.import_from_file(&path);
        assert!(!result.is_success());
        let last = notifier.last();
        assert_eq!(last.level, NotificationLevel::Error);
        assert!(last.message.starts_with("Import failed: "));
        assert_eq!(store.get("theme").as_deref(), Some("dark"));

        let missing = service.import_from_file(&temp_dir.path().join("nope.json"));
        assert!(!missing.is_success());
        assert_eq!(notifier.last().message, "File could not be read");
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let (store, notifier, confirmer, service) = setup(false);
        store.set("theme", "dark");

        assert!(!service.clear_all().await);
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
        assert!(notifier.seen.lock().unwrap().is_empty());

        let asked = confirmer.asked.lock().unwrap();
        assert_eq!(asked[0].confirm_label, "Clear all data");
        assert_eq!(asked[0].cancel_label, "Cancel");
    }

    #[tokio::test]
    async fn test_clear_confirmed() {
        let (store, notifier, _, service) = setup(true);
        store.set("theme", "dark");

        assert!(service.clear_all().await);
        assert_eq!(store.get("theme"), None);
        assert_eq!(notifier.last().message, "All data cleared");
    }
}
