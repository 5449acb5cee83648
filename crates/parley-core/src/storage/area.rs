//! The host storage abstraction.

use thiserror::Error;

use crate::error::ParleyError;

/// Errors a storage area can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageAreaError {
    /// The write would exceed the area's quota. Nothing was written.
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// The area cannot be read or written (I/O failure, lock failure, corrupt backing file).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageAreaError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl From<StorageAreaError> for ParleyError {
    fn from(err: StorageAreaError) -> Self {
        match err {
            StorageAreaError::QuotaExceeded => ParleyError::QuotaExceeded,
            StorageAreaError::Unavailable(message) => ParleyError::Storage(message),
        }
    }
}

/// A flat string-to-string storage area, shared by every session.
///
/// Mirrors what a browser exposes as local/session storage: physical keys,
/// string values, and an enumeration of all keys. Implementations must
/// enumerate keys in a deterministic order; eviction tie-breaking relies on it.
pub trait StorageArea: Send + Sync {
    /// Reads a value. `Ok(None)` if the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageAreaError>;

    /// Writes a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageAreaError>;

    /// Removes a key. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageAreaError>;

    /// Lists every physical key in enumeration order.
    fn keys(&self) -> Result<Vec<String>, StorageAreaError>;

    /// Replaces every key starting with `prefix` by `entries`, atomically.
    ///
    /// Either all entries are installed and every other key under `prefix`
    /// is gone, or the area is left unchanged. Keys outside `prefix` are
    /// never touched.
    fn replace_namespace(
        &self,
        prefix: &str,
        entries: Vec<(String, String)>,
    ) -> Result<(), StorageAreaError>;
}
