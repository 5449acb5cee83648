//! Namespaced key-value store.
//!
//! `KvStore` layers session namespacing, usage accounting, quota eviction,
//! export/import and data repair over a [`StorageArea`]. Physical keys are
//! `<prefix><session id>_<logical key>`.
//!
//! Reads and writes are confined to the active session. `clear`, eviction and
//! `import_data` act on every session under the prefix; they are only
//! reachable through [`AdminStore`].
//!
//! Storage failures never escape: they are logged and turned into
//! `None` / `false` / failed results, as the capability traits describe.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use parley_core::config::{ParleyConfig, RetentionConfig};
use parley_core::id::generate_message_id;
use parley_core::storage::keys::{self, BACKGROUND_GALLERY, BUNDLE_VERSION, MESSAGES, SETTINGS};
use parley_core::storage::{
    AdminStore, EvictionCandidate, EvictionPolicy, EvictionReport, ExportBundle, ImportResult,
    ImportSummary, SessionScopedStore, StorageArea, StorageAreaError, StorageUsage, StoreError,
    ValidationReport,
};
use serde_json::Value as JsonValue;

use crate::eviction::OldestFraction;
use crate::session_identity::SessionIdentity;

/// Tunables for a [`KvStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct KvStoreOptions {
    pub prefix: String,
    pub retention: RetentionConfig,
    pub usage_warning_bytes: u64,
    /// Retry a write once after eviction freed at least one key.
    pub retry_after_eviction: bool,
}

impl Default for KvStoreOptions {
    fn default() -> Self {
        let config = ParleyConfig::default();
        Self::from(&config)
    }
}

impl From<&ParleyConfig> for KvStoreOptions {
    fn from(config: &ParleyConfig) -> Self {
        Self {
            prefix: config.storage.prefix.clone(),
            retention: config.retention.clone(),
            usage_warning_bytes: config.storage.usage_warning_bytes,
            retry_after_eviction: config.eviction.retry_after_eviction,
        }
    }
}

/// The session-namespaced store.
pub struct KvStore {
    area: Arc<dyn StorageArea>,
    identity: SessionIdentity,
    eviction: Option<Box<dyn EvictionPolicy>>,
    options: KvStoreOptions,
}

impl KvStore {
    /// Creates a store with default options and no eviction policy.
    ///
    /// * `area` - persistent area holding the namespaced keys
    /// * `session_area` - session-lifetime area holding the session id
    pub fn new(area: Arc<dyn StorageArea>, session_area: Arc<dyn StorageArea>) -> Self {
        Self {
            area,
            identity: SessionIdentity::new(session_area),
            eviction: None,
            options: KvStoreOptions::default(),
        }
    }

    /// Creates a store configured from `config`, installing the
    /// oldest-fraction policy when eviction is enabled.
    pub fn from_config(
        area: Arc<dyn StorageArea>,
        session_area: Arc<dyn StorageArea>,
        config: &ParleyConfig,
    ) -> Self {
        let store = Self::new(area, session_area).with_options(KvStoreOptions::from(config));
        if config.eviction.enabled {
            store.with_eviction_policy(Box::new(OldestFraction::new(config.eviction.fraction)))
        } else {
            store
        }
    }

    pub fn with_options(mut self, options: KvStoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Opts into eviction on quota errors.
    pub fn with_eviction_policy(mut self, policy: Box<dyn EvictionPolicy>) -> Self {
        self.eviction = Some(policy);
        self
    }

    pub fn options(&self) -> &KvStoreOptions {
        &self.options
    }

    fn physical(&self, key: &str) -> String {
        keys::namespaced(&self.options.prefix, &self.session_id(), key)
    }

    fn session_prefix(&self) -> String {
        format!("{}{}_", self.options.prefix, self.session_id())
    }

    /// Every `(physical key, value)` under the global prefix, in enumeration order.
    fn global_entries(&self) -> Result<Vec<(String, String)>, StorageAreaError> {
        let mut entries = Vec::new();
        for key in self.area.keys()? {
            if !key.starts_with(&self.options.prefix) {
                continue;
            }
            if let Some(value) = self.area.get_item(&key)? {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }

    /// Every `(logical key, value)` of the active session.
    fn session_entries(&self) -> Result<Vec<(String, String)>, StorageAreaError> {
        let session_prefix = self.session_prefix();
        let mut entries = Vec::new();
        for key in self.area.keys()? {
            let Some(logical) = key.strip_prefix(&session_prefix) else {
                continue;
            };
            if let Some(value) = self.area.get_item(&key)? {
                entries.push((logical.to_string(), value));
            }
        }
        Ok(entries)
    }

    /// Keeps the last `keep` entries of a stored JSON list longer than `max`.
    fn truncate_list(&self, key: &str, max: usize, keep: usize) {
        let Some(raw) = self.get(key) else {
            return;
        };

        let items = match serde_json::from_str::<JsonValue>(&raw) {
            Ok(JsonValue::Array(items)) => items,
            Ok(_) => return,
            Err(e) => {
                tracing::error!("[Storage] Failed to compress '{}': {}", key, e);
                return;
            }
        };

        if items.len() <= max {
            return;
        }

        let before = items.len();
        let kept = &items[before - keep.min(before)..];
        match serde_json::to_string(kept) {
            Ok(json) => {
                if self.set(key, &json) {
                    tracing::info!(
                        "[Storage] Compressed '{}' from {} to {} entries",
                        key,
                        before,
                        kept.len()
                    );
                }
            }
            Err(e) => tracing::error!("[Storage] Failed to compress '{}': {}", key, e),
        }
    }
}

/// Reads the numeric `timestamp` field of a stored JSON value, 0 otherwise.
fn value_timestamp(raw: &str) -> f64 {
    serde_json::from_str::<JsonValue>(raw)
        .ok()
        .and_then(|value| value.get("timestamp").and_then(JsonValue::as_f64))
        .unwrap_or(0.0)
}

/// JavaScript truthiness of an optional JSON field.
fn is_truthy(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl SessionScopedStore for KvStore {
    fn session_id(&self) -> String {
        self.identity.current_session_id()
    }

    fn try_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let physical = self.physical(key);

        match self.area.set_item(&physical, value) {
            Ok(()) => Ok(()),
            Err(StorageAreaError::Unavailable(message)) => Err(StoreError::Unavailable(message)),
            Err(StorageAreaError::QuotaExceeded) => {
                tracing::warn!("[Storage] Quota exceeded while writing '{}'", key);
                let eviction = self.handle_quota_exceeded();

                let freed = eviction
                    .as_ref()
                    .is_some_and(|report| !report.evicted.is_empty());
                if self.options.retry_after_eviction && freed {
                    match self.area.set_item(&physical, value) {
                        Ok(()) => {
                            tracing::info!("[Storage] Write of '{}' succeeded after eviction", key);
                            return Ok(());
                        }
                        Err(e) => {
                            tracing::warn!("[Storage] Retry of '{}' failed: {}", key, e);
                        }
                    }
                }

                Err(StoreError::QuotaExceeded { eviction })
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> bool {
        match self.try_set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("[Storage] Failed to write '{}': {}", key, e);
                false
            }
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.area.get_item(&self.physical(key)) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("[Storage] Failed to read '{}': {}", key, e);
                None
            }
        }
    }

    fn remove(&self, key: &str) -> bool {
        match self.area.remove_item(&self.physical(key)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("[Storage] Failed to remove '{}': {}", key, e);
                false
            }
        }
    }

    fn storage_usage(&self) -> Option<StorageUsage> {
        match self.session_entries() {
            Ok(entries) => Some(StorageUsage::from_items(
                entries.iter().map(|(key, value)| (key.clone(), value.as_str())),
            )),
            Err(e) => {
                tracing::error!("[Storage] Failed to compute storage usage: {}", e);
                None
            }
        }
    }

    fn export_data(&self) -> Option<String> {
        let entries = match self.session_entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("[Storage] Export failed: {}", e);
                return None;
            }
        };

        let bundle = ExportBundle {
            version: BUNDLE_VERSION.to_string(),
            timestamp: Some(now_iso()),
            session_id: Some(self.session_id()),
            data: entries.into_iter().collect(),
        };

        match serde_json::to_string_pretty(&bundle) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("[Storage] Export failed: {}", e);
                None
            }
        }
    }
}

impl AdminStore for KvStore {
    fn clear(&self) -> bool {
        match self.area.replace_namespace(&self.options.prefix, Vec::new()) {
            Ok(()) => {
                tracing::info!("[Storage] Cleared every key under '{}'", self.options.prefix);
                true
            }
            Err(e) => {
                tracing::error!("[Storage] Failed to clear storage: {}", e);
                false
            }
        }
    }

    fn handle_quota_exceeded(&self) -> Option<EvictionReport> {
        let Some(policy) = self.eviction.as_ref() else {
            tracing::warn!("[Storage] Storage is full and no eviction policy is configured");
            return None;
        };

        let entries = match self.global_entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("[Storage] Eviction failed to enumerate keys: {}", e);
                return None;
            }
        };

        let candidates: Vec<EvictionCandidate> = entries
            .iter()
            .map(|(key, value)| EvictionCandidate {
                key: key.clone(),
                timestamp: value_timestamp(value),
            })
            .collect();

        let mut evicted = Vec::new();
        for key in policy.select(&candidates) {
            match self.area.remove_item(&key) {
                Ok(()) => evicted.push(key),
                Err(e) => tracing::warn!("[Storage] Failed to evict '{}': {}", key, e),
            }
        }

        tracing::info!(
            "[Storage] Evicted {} of {} items ({})",
            evicted.len(),
            candidates.len(),
            policy.name()
        );

        Some(EvictionReport {
            policy: policy.name().to_string(),
            scanned: candidates.len(),
            evicted,
        })
    }

    fn import_data(&self, json: &str) -> ImportResult {
        let bundle = match ExportBundle::parse(json) {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::error!("[Storage] Import failed: {}", e);
                return ImportResult::failed(e.to_string());
            }
        };

        // Entries go under the session that is active once the import is done
        let target_session = bundle
            .session_id
            .clone()
            .unwrap_or_else(|| self.session_id());

        let staged: Vec<(String, String)> = bundle
            .data
            .iter()
            .map(|(key, value)| {
                (
                    keys::namespaced(&self.options.prefix, &target_session, key),
                    value.clone(),
                )
            })
            .collect();

        if let Err(e) = self.area.replace_namespace(&self.options.prefix, staged) {
            tracing::error!("[Storage] Import failed, storage left unchanged: {}", e);
            return ImportResult::failed(e.to_string());
        }

        if let Some(session_id) = bundle.session_id.as_deref() {
            self.identity.set_session_id(session_id);
        }

        tracing::info!(
            "[Storage] Imported {} items (bundle version {})",
            bundle.item_count(),
            bundle.version
        );

        ImportResult::Imported(ImportSummary {
            item_count: bundle.item_count(),
            version: bundle.version,
            timestamp: bundle.timestamp,
        })
    }

    fn compress_data(&self) -> bool {
        if self.storage_usage().is_none() {
            return false;
        }

        let retention = &self.options.retention;
        self.truncate_list(MESSAGES, retention.max_messages, retention.keep_messages);
        self.truncate_list(
            BACKGROUND_GALLERY,
            retention.max_backgrounds,
            retention.keep_backgrounds,
        );
        true
    }

    fn validate_data(&self) -> ValidationReport {
        let mut issues = Vec::new();

        if let Some(raw) = self.get(MESSAGES) {
            match serde_json::from_str::<JsonValue>(&raw) {
                Ok(JsonValue::Array(items)) => {
                    for (index, item) in items.iter().enumerate() {
                        if !is_truthy(item.get("id")) || !is_truthy(item.get("timestamp")) {
                            issues.push(format!("Message {} is missing required fields", index));
                        }
                    }
                }
                Ok(_) => issues.push("Message data is not a list".to_string()),
                Err(_) => issues.push("Message data could not be parsed".to_string()),
            }
        }

        if let Some(raw) = self.get(SETTINGS) {
            if serde_json::from_str::<JsonValue>(&raw).is_err() {
                issues.push("Settings data is malformed".to_string());
            }
        }

        let usage = self.storage_usage();
        if let Some(usage) = usage.as_ref() {
            if usage.total as u64 > self.options.usage_warning_bytes {
                issues.push("Storage usage is too high".to_string());
            }
        }

        ValidationReport {
            valid: issues.is_empty(),
            issues,
            usage,
        }
    }

    fn repair_data(&self) -> bool {
        if let Err(e) = self.area.keys() {
            tracing::error!("[Storage] Repair failed: {}", e);
            return false;
        }

        let report = self.validate_data();
        if report.valid {
            return true;
        }
        tracing::info!("[Storage] Repairing data: {:?}", report.issues);

        if let Some(raw) = self.get(MESSAGES) {
            match serde_json::from_str::<JsonValue>(&raw) {
                Ok(value) => {
                    let mut items = match value {
                        JsonValue::Array(items) => items,
                        _ => Vec::new(),
                    };

                    for item in items.iter_mut() {
                        let JsonValue::Object(message) = item else {
                            continue;
                        };
                        if !is_truthy(message.get("id")) {
                            message.insert("id".to_string(), JsonValue::String(generate_message_id()));
                        }
                        if !is_truthy(message.get("timestamp")) {
                            message.insert("timestamp".to_string(), JsonValue::String(now_iso()));
                        }
                    }

                    match serde_json::to_string(&items) {
                        Ok(json) => {
                            if self.set(MESSAGES, &json) {
                                tracing::info!("[Storage] Message data repaired");
                            }
                        }
                        Err(e) => tracing::error!("[Storage] Failed to repair messages: {}", e),
                    }
                }
                Err(e) => tracing::error!("[Storage] Failed to repair messages: {}", e),
            }
        }

        self.compress_data();
        true
    }

    fn list_sessions(&self) -> Vec<String> {
        let keys = match self.area.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!("[Storage] Failed to list sessions: {}", e);
                return Vec::new();
            }
        };

        keys.iter()
            .filter_map(|key| keys::split_namespaced(&self.options.prefix, key))
            .map(|(session, _)| session.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn set_session_id(&self, session_id: &str) {
        self.identity.set_session_id(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorageArea;
    use parley_core::storage::keys::SESSION_KEY;

    fn store_with_session(area: Arc<MemoryStorageArea>, session: &str) -> KvStore {
        let session_area = Arc::new(MemoryStorageArea::new());
        session_area.set_item(SESSION_KEY, session).unwrap();
        KvStore::new(area, session_area)
    }

    fn fresh_store() -> (Arc<MemoryStorageArea>, KvStore) {
        let area = Arc::new(MemoryStorageArea::new());
        let store = store_with_session(area.clone(), "session_1_aaa");
        (area, store)
    }

    fn messages_json(count: usize) -> String {
        let items: Vec<JsonValue> = (0..count)
            .map(|i| serde_json::json!({"id": format!("m{}", i), "timestamp": "2024-01-01T00:00:00Z", "text": "x"}))
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    #[test]
    fn test_set_then_get_exact_string() {
        let (area, store) = fresh_store();
        let value = r#"[{"id":"a","timestamp":"2024-01-01T00:00:00Z"}]"#;

        assert!(store.set("messages", value));
        assert_eq!(store.get("messages").as_deref(), Some(value));
        assert!(
            area.get_item("parley_session_1_aaa_messages")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_sessions_are_isolated() {
        let area = Arc::new(MemoryStorageArea::new());
        let first = store_with_session(area.clone(), "session_1_aaa");
        let second = store_with_session(area.clone(), "session_2_bbb");

        first.set("settings", "{}");

        assert_eq!(second.get("settings"), None);
        assert_eq!(first.get("settings").as_deref(), Some("{}"));
        assert_eq!(
            first.list_sessions(),
            vec!["session_1_aaa".to_string()]
        );
    }

    #[test]
    fn test_remove() {
        let (_, store) = fresh_store();
        store.set("theme", "dark");
        assert!(store.remove("theme"));
        assert_eq!(store.get("theme"), None);
    }

    #[test]
    fn test_clear_is_global() {
        let area = Arc::new(MemoryStorageArea::new());
        let first = store_with_session(area.clone(), "session_1_aaa");
        let second = store_with_session(area.clone(), "session_2_bbb");
        area.set_item("unrelated", "keep").unwrap();

        first.set("theme", "dark");
        second.set("theme", "light");

        assert!(first.clear());

        assert_eq!(second.get("theme"), None);
        assert_eq!(area.keys().unwrap(), vec!["unrelated"]);
    }

    #[test]
    fn test_usage_is_session_scoped() {
        let area = Arc::new(MemoryStorageArea::new());
        let first = store_with_session(area.clone(), "session_1_aaa");
        let second = store_with_session(area, "session_2_bbb");

        first.set("messages", "[1,2,3]");
        first.set("theme", "dark");
        second.set("messages", "[1,2,3,4,5,6,7,8,9,10]");

        let usage = first.storage_usage().unwrap();
        assert_eq!(usage.item_count, 2);
        assert_eq!(usage.total, 7 + 4);
        assert_eq!(usage.items[0].key, "messages");
    }

    #[test]
    fn test_export_import_round_trip() {
        let (_, source) = fresh_store();
        source.set("settings", r#"{"autoSave":true}"#);
        source.set("messages", &messages_json(3));
        source.set("theme", "dark");
        let exported = source.export_data().unwrap();

        let target_area = Arc::new(MemoryStorageArea::new());
        let target = store_with_session(target_area, "session_9_zzz");
        let result = target.import_data(&exported);

        assert!(result.is_success());
        assert_eq!(result.item_count(), Some(3));
        assert_eq!(target.session_id(), "session_1_aaa");
        for key in ["settings", "messages", "theme"] {
            assert_eq!(target.get(key), source.get(key), "key {}", key);
        }
    }

    #[test]
    fn test_import_without_session_keeps_current() {
        let (_, store) = fresh_store();
        let result = store.import_data(
            r#"{"version":"2.0.0","timestamp":"2024-01-01T00:00:00.000Z","data":{"settings":"{\"autoSave\":true}"}}"#,
        );

        match &result {
            ImportResult::Imported(summary) => {
                assert_eq!(summary.item_count, 1);
                assert_eq!(summary.version, "2.0.0");
                assert_eq!(summary.timestamp.as_deref(), Some("2024-01-01T00:00:00.000Z"));
            }
            ImportResult::Failed { error } => panic!("import failed: {}", error),
        }
        assert_eq!(store.session_id(), "session_1_aaa");
        assert_eq!(store.get("settings").as_deref(), Some(r#"{"autoSave":true}"#));
    }

    #[test]
    fn test_import_is_destructive_across_sessions() {
        let area = Arc::new(MemoryStorageArea::new());
        let first = store_with_session(area.clone(), "session_1_aaa");
        let second = store_with_session(area.clone(), "session_2_bbb");
        second.set("theme", "light");

        first.import_data(r#"{"version":"2.0.0","data":{"theme":"dark"}}"#);

        assert_eq!(second.get("theme"), None);
        assert_eq!(first.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_invalid_import_leaves_data_untouched() {
        let (area, store) = fresh_store();
        store.set("theme", "dark");
        let before = area.keys().unwrap();

        let result = store.import_data("{}");

        match result {
            ImportResult::Failed { error } => assert!(error.contains("Invalid data format")),
            ImportResult::Imported(_) => panic!("expected failure"),
        }
        assert_eq!(area.keys().unwrap(), before);
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_import_over_quota_is_all_or_nothing() {
        let area = Arc::new(MemoryStorageArea::with_quota(200));
        let store = store_with_session(area.clone(), "session_1_aaa");
        store.set("theme", "dark");

        let big = "x".repeat(500);
        let bundle = format!(r#"{{"version":"2.0.0","data":{{"messages":"{}"}}}}"#, big);
        let result = store.import_data(&bundle);

        assert!(!result.is_success());
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
        assert_eq!(store.get("messages"), None);
    }

    #[test]
    fn test_compress_truncates_to_most_recent() {
        let (_, store) = fresh_store();
        store.set("messages", &messages_json(1200));

        let galleries: Vec<String> = (0..12).map(|i| format!("bg{}", i)).collect();
        store.set("backgroundGallery", &serde_json::to_string(&galleries).unwrap());

        assert!(store.compress_data());

        let messages: Vec<JsonValue> = serde_json::from_str(&store.get("messages").unwrap()).unwrap();
        assert_eq!(messages.len(), 500);
        assert_eq!(messages[0]["id"], "m700");
        assert_eq!(messages[499]["id"], "m1199");

        let gallery: Vec<String> =
            serde_json::from_str(&store.get("backgroundGallery").unwrap()).unwrap();
        assert_eq!(gallery, vec!["bg7", "bg8", "bg9", "bg10", "bg11"]);
    }

    #[test]
    fn test_compress_leaves_small_lists_and_garbage() {
        let (_, store) = fresh_store();
        let small = messages_json(1000);
        store.set("messages", &small);
        store.set("backgroundGallery", "not json");

        assert!(store.compress_data());
        assert_eq!(store.get("messages").as_deref(), Some(small.as_str()));
        assert_eq!(store.get("backgroundGallery").as_deref(), Some("not json"));
    }

    #[test]
    fn test_validate_reports_issues() {
        let (_, store) = fresh_store();
        assert!(store.validate_data().valid);

        store.set("messages", r#"[{"id":"a","timestamp":"t"},{"id":"","timestamp":"t"},{"text":"x"}]"#);
        store.set("settings", "{broken");

        let report = store.validate_data();
        assert!(!report.valid);
        assert_eq!(
            report.issues,
            vec![
                "Message 1 is missing required fields".to_string(),
                "Message 2 is missing required fields".to_string(),
                "Settings data is malformed".to_string(),
            ]
        );
        assert!(report.usage.is_some());
    }

    #[test]
    fn test_validate_flags_usage() {
        let area = Arc::new(MemoryStorageArea::new());
        let store = store_with_session(area, "session_1_aaa").with_options(KvStoreOptions {
            usage_warning_bytes: 10,
            ..KvStoreOptions::default()
        });
        store.set("theme", "a much longer value than ten bytes");

        let report = store.validate_data();
        assert_eq!(report.issues, vec!["Storage usage is too high".to_string()]);
    }

    #[test]
    fn test_repair_backfills_and_is_idempotent() {
        let (_, store) = fresh_store();
        store.set("messages", r#"[{"text":"no id"},{"id":"ok","timestamp":"2024-01-01T00:00:00Z"}]"#);

        assert!(store.repair_data());
        let first = store.get("messages").unwrap();
        assert!(store.validate_data().valid);

        let repaired: Vec<JsonValue> = serde_json::from_str(&first).unwrap();
        assert!(is_truthy(repaired[0].get("id")));
        assert!(is_truthy(repaired[0].get("timestamp")));
        assert_eq!(repaired[1]["id"], "ok");

        assert!(store.repair_data());
        assert_eq!(store.get("messages").unwrap(), first);
    }

    #[test]
    fn test_repair_coerces_non_list() {
        let (_, store) = fresh_store();
        store.set("messages", r#"{"not":"a list"}"#);

        assert!(store.repair_data());
        assert_eq!(store.get("messages").as_deref(), Some("[]"));
    }

    #[test]
    fn test_eviction_removes_oldest_quarter_globally() {
        let area = Arc::new(MemoryStorageArea::new());
        let first = store_with_session(area.clone(), "session_1_aaa")
            .with_eviction_policy(Box::new(OldestFraction::default()));
        let second = store_with_session(area.clone(), "session_2_bbb");

        first.set("a", r#"{"timestamp":300}"#);
        first.set("b", r#"{"timestamp":100}"#);
        second.set("c", r#"{"timestamp":200}"#);
        second.set("d", "plain text");
        second.set("e", r#"{"timestamp":500}"#);

        let report = first.handle_quota_exceeded().unwrap();

        // ceil(5 * 0.25) = 2: the unparseable value counts as 0, then timestamp 100
        assert_eq!(report.scanned, 5);
        assert_eq!(
            report.evicted,
            vec![
                "parley_session_2_bbb_d".to_string(),
                "parley_session_1_aaa_b".to_string(),
            ]
        );
        assert_eq!(first.get("b"), None);
        assert_eq!(second.get("d"), None);
        assert!(first.get("a").is_some());
    }

    #[test]
    fn test_quota_write_is_dropped_and_reported() {
        let area = Arc::new(MemoryStorageArea::with_quota(120));
        let store = store_with_session(area.clone(), "session_1_aaa")
            .with_eviction_policy(Box::new(OldestFraction::default()));

        assert!(store.set("a", r#"{"timestamp":1}"#));
        assert!(store.set("b", r#"{"timestamp":2}"#));

        let result = store.try_set("c", &"x".repeat(60));
        match result {
            Err(StoreError::QuotaExceeded { eviction: Some(report) }) => {
                assert_eq!(report.evicted, vec!["parley_session_1_aaa_a".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // Dropped, not retried
        assert_eq!(store.get("c"), None);
    }

    #[test]
    fn test_quota_write_retried_when_configured() {
        let area = Arc::new(MemoryStorageArea::with_quota(120));
        let store = store_with_session(area.clone(), "session_1_aaa")
            .with_options(KvStoreOptions {
                retry_after_eviction: true,
                ..KvStoreOptions::default()
            })
            .with_eviction_policy(Box::new(OldestFraction::default()));

        store.set("a", r#"{"timestamp":1}"#);
        store.set("b", r#"{"timestamp":2}"#);

        assert!(store.set("c", &"x".repeat(60)));
        assert_eq!(store.get("a"), None);
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_quota_without_policy_evicts_nothing() {
        let area = Arc::new(MemoryStorageArea::with_quota(60));
        let store = store_with_session(area.clone(), "session_1_aaa");
        store.set("a", "1");

        assert_eq!(
            store.try_set("b", &"x".repeat(100)),
            Err(StoreError::QuotaExceeded { eviction: None })
        );
        assert_eq!(store.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn test_from_config_installs_policy() {
        let config = ParleyConfig::default();
        let store = KvStore::from_config(
            Arc::new(MemoryStorageArea::new()),
            Arc::new(MemoryStorageArea::new()),
            &config,
        );
        assert!(store.handle_quota_exceeded().is_some());

        let mut disabled = ParleyConfig::default();
        disabled.eviction.enabled = false;
        let store = KvStore::from_config(
            Arc::new(MemoryStorageArea::new()),
            Arc::new(MemoryStorageArea::new()),
            &disabled,
        );
        assert!(store.handle_quota_exceeded().is_none());
    }
}
