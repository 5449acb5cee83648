//! File-backed storage area with atomic writes.
//!
//! The whole area is one JSON object (`{"physical key": "value", ...}`).
//! Every mutation runs under an exclusive lock, rewrites the object to a
//! uniquely named temporary file, fsyncs it and renames it over the original.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parley_core::storage::{StorageArea, StorageAreaError};
use tempfile::NamedTempFile;

use super::memory_area::{fits_after_write, replaced_namespace};

type Entries = BTreeMap<String, String>;

/// A storage area persisted to a single JSON file.
///
/// Provides:
/// - **Atomicity**: each mutation is all-or-nothing via tmp file + atomic rename
/// - **Isolation**: an exclusive lock on a persistent `<name>.lock` file
///   serializes writers across handles and processes
/// - **Durability**: explicit fsync before rename
///
/// A missing or empty file reads as an empty area.
#[derive(Debug, Clone)]
pub struct FileStorageArea {
    path: PathBuf,
    quota: Option<u64>,
}

impl FileStorageArea {
    /// Creates a handle for the area stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            quota: None,
        }
    }

    /// Caps the sum of key and value byte lengths.
    pub fn with_quota(mut self, quota: Option<u64>) -> Self {
        self.quota = quota;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the backing file. Used to end a session-lifetime area.
    pub fn destroy(&self) -> Result<(), StorageAreaError> {
        let _lock = FileLock::acquire(&self.path)?;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(io_error)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<Entries, StorageAreaError> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let content = fs::read_to_string(&self.path).map_err(io_error)?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageAreaError::unavailable(format!(
                "corrupt storage file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn save(&self, entries: &Entries) -> Result<(), StorageAreaError> {
        let parent = self.parent_dir()?;
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let json = serde_json::to_string(entries)
            .map_err(|e| StorageAreaError::unavailable(format!("serialize failed: {}", e)))?;

        let mut tmp_file = NamedTempFile::new_in(parent).map_err(io_error)?;
        tmp_file.write_all(json.as_bytes()).map_err(io_error)?;
        tmp_file.as_file().sync_all().map_err(io_error)?;
        tmp_file
            .persist(&self.path)
            .map_err(|e| io_error(e.error))?;
        Ok(())
    }

    /// Loads, applies `f`, and saves under the exclusive lock.
    fn update<F>(&self, f: F) -> Result<(), StorageAreaError>
    where
        F: FnOnce(&mut Entries) -> Result<(), StorageAreaError>,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let mut entries = self.load()?;
        f(&mut entries)?;
        self.save(&entries)
    }

    fn parent_dir(&self) -> Result<&Path, StorageAreaError> {
        match self.path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Ok(Path::new(".")),
            Some(parent) => Ok(parent),
            None => Err(StorageAreaError::unavailable(
                "storage path has no parent directory",
            )),
        }
    }
}

impl StorageArea for FileStorageArea {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageAreaError> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageAreaError> {
        let quota = self.quota;
        self.update(|entries| {
            if !fits_after_write(entries, quota, key, value) {
                return Err(StorageAreaError::QuotaExceeded);
            }
            entries.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageAreaError> {
        self.update(|entries| {
            entries.remove(key);
            Ok(())
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageAreaError> {
        Ok(self.load()?.into_keys().collect())
    }

    fn replace_namespace(
        &self,
        prefix: &str,
        new_entries: Vec<(String, String)>,
    ) -> Result<(), StorageAreaError> {
        let quota = self.quota;
        self.update(|entries| {
            *entries = replaced_namespace(entries, quota, prefix, new_entries)?;
            Ok(())
        })
    }
}

fn io_error(err: std::io::Error) -> StorageAreaError {
    StorageAreaError::unavailable(format!("{} (kind: {:?})", err, err.kind()))
}

/// Exclusive lock on `<name>.lock`, released when the guard is dropped.
///
/// The lock file is never removed, so every handle locks the same inode.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, StorageAreaError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error)?;

        file.lock_exclusive().map_err(|e| {
            StorageAreaError::unavailable(format!("Failed to acquire lock: {}", e))
        })?;

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
