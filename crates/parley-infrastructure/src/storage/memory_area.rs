//! In-memory storage area.

use std::collections::BTreeMap;
use std::sync::Mutex;

use parley_core::storage::{StorageArea, StorageAreaError};

/// A storage area that lives for the life of the process.
///
/// Serves as the session-lifetime area and as a test double for the
/// persistent area. Keys enumerate in lexicographic order. An optional quota
/// caps the sum of key and value byte lengths.
#[derive(Debug, Default)]
pub struct MemoryStorageArea {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<u64>,
}

impl MemoryStorageArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an area that rejects writes beyond `quota` bytes.
    pub fn with_quota(quota: u64) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota: Some(quota),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageAreaError> {
        self.entries
            .lock()
            .map_err(|e| StorageAreaError::unavailable(format!("memory area poisoned: {}", e)))
    }
}

/// Bytes a map occupies under quota accounting.
pub(crate) fn used_bytes(entries: &BTreeMap<String, String>) -> u64 {
    entries
        .iter()
        .map(|(k, v)| (k.len() + v.len()) as u64)
        .sum()
}

/// Checks whether writing `value` under `key` keeps `entries` within `quota`.
pub(crate) fn fits_after_write(
    entries: &BTreeMap<String, String>,
    quota: Option<u64>,
    key: &str,
    value: &str,
) -> bool {
    let Some(quota) = quota else {
        return true;
    };
    let current = used_bytes(entries);
    let replaced = entries
        .get(key)
        .map(|old| (key.len() + old.len()) as u64)
        .unwrap_or(0);
    current - replaced + (key.len() + value.len()) as u64 <= quota
}

/// Builds the map `replace_namespace` would produce, or fails on quota.
pub(crate) fn replaced_namespace(
    entries: &BTreeMap<String, String>,
    quota: Option<u64>,
    prefix: &str,
    new_entries: Vec<(String, String)>,
) -> Result<BTreeMap<String, String>, StorageAreaError> {
    let mut next: BTreeMap<String, String> = entries
        .iter()
        .filter(|(k, _)| !k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    next.extend(new_entries);

    if let Some(quota) = quota {
        if used_bytes(&next) > quota {
            return Err(StorageAreaError::QuotaExceeded);
        }
    }
    Ok(next)
}

impl StorageArea for MemoryStorageArea {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageAreaError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageAreaError> {
        let mut entries = self.lock()?;
        if !fits_after_write(&entries, self.quota, key, value) {
            return Err(StorageAreaError::QuotaExceeded);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageAreaError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageAreaError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn replace_namespace(
        &self,
        prefix: &str,
        entries: Vec<(String, String)>,
    ) -> Result<(), StorageAreaError> {
        let mut current = self.lock()?;
        let next = replaced_namespace(&current, self.quota, prefix, entries)?;
        *current = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let area = MemoryStorageArea::new();
        area.set_item("a", "1").unwrap();
        assert_eq!(area.get_item("a").unwrap(), Some("1".to_string()));
        area.remove_item("a").unwrap();
        assert_eq!(area.get_item("a").unwrap(), None);
        // Removing again is fine
        area.remove_item("a").unwrap();
    }

    #[test]
    fn test_quota_rejects_without_writing() {
        let area = MemoryStorageArea::with_quota(10);
        area.set_item("k", "12345").unwrap(); // 6 bytes
        assert_eq!(
            area.set_item("j", "123456"),
            Err(StorageAreaError::QuotaExceeded)
        );
        assert_eq!(area.get_item("j").unwrap(), None);
        // Overwriting an existing key only counts the difference
        area.set_item("k", "123456789").unwrap();
    }

    #[test]
    fn test_replace_namespace_keeps_foreign_keys() {
        let area = MemoryStorageArea::new();
        area.set_item("p_a", "1").unwrap();
        area.set_item("p_b", "2").unwrap();
        area.set_item("other", "x").unwrap();

        area.replace_namespace("p_", vec![("p_c".to_string(), "3".to_string())])
            .unwrap();

        assert_eq!(area.keys().unwrap(), vec!["other", "p_c"]);
    }

    #[test]
    fn test_replace_namespace_is_all_or_nothing() {
        let area = MemoryStorageArea::with_quota(8);
        area.set_item("p_a", "1").unwrap();

        let result = area.replace_namespace(
            "p_",
            vec![("p_big".to_string(), "0123456789".to_string())],
        );
        assert_eq!(result, Err(StorageAreaError::QuotaExceeded));
        assert_eq!(area.get_item("p_a").unwrap(), Some("1".to_string()));
    }
}
