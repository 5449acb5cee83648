//! Store capabilities and the eviction seam.
//!
//! Session-scoped operations and namespace-wide administrative operations are
//! split into two traits so callers state which reach they need.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bundle::ImportResult;
use super::usage::StorageUsage;
use crate::error::ParleyError;

/// A key considered for eviction, with the `timestamp` parsed from its value.
#[derive(Debug, Clone, PartialEq)]
pub struct EvictionCandidate {
    /// Physical key.
    pub key: String,
    /// Numeric `timestamp` field of the JSON value, 0 when absent or unparseable.
    pub timestamp: f64,
}

/// What an eviction run deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvictionReport {
    pub policy: String,
    /// Number of keys under the global prefix when the run started.
    pub scanned: usize,
    /// Physical keys that were removed.
    pub evicted: Vec<String>,
}

/// Chooses which keys to delete when the storage area is full.
///
/// Candidates arrive in the area's enumeration order and span every session
/// under the global prefix.
pub trait EvictionPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the physical keys to delete.
    fn select(&self, candidates: &[EvictionCandidate]) -> Vec<String>;
}

/// Typed failure of a store write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The area is full. `eviction` reports what the configured policy freed,
    /// or `None` if no policy is configured.
    #[error("storage quota exceeded")]
    QuotaExceeded { eviction: Option<EvictionReport> },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ParleyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QuotaExceeded { .. } => ParleyError::QuotaExceeded,
            StoreError::Unavailable(message) => ParleyError::Storage(message),
        }
    }
}

/// Result of `validate_data`. Purely diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
    pub usage: Option<StorageUsage>,
}

/// Operations confined to the active session's namespace.
pub trait SessionScopedStore: Send + Sync {
    /// Returns the active session id.
    fn session_id(&self) -> String;

    /// Writes a value, reporting why a write failed.
    fn try_set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Writes a value. Failures are logged and reported as `false`.
    fn set(&self, key: &str, value: &str) -> bool;

    /// Reads a value. Missing keys and read failures both yield `None`.
    fn get(&self, key: &str) -> Option<String>;

    fn remove(&self, key: &str) -> bool;

    /// Usage of the active session's keys.
    fn storage_usage(&self) -> Option<StorageUsage>;

    /// Pretty-printed export bundle of the active session.
    fn export_data(&self) -> Option<String>;
}

/// Operations that reach across every session under the global prefix.
pub trait AdminStore: SessionScopedStore {
    /// Deletes every key under the global prefix, for all sessions.
    fn clear(&self) -> bool;

    /// Runs the configured eviction policy. `None` if no policy is configured
    /// or the run failed.
    fn handle_quota_exceeded(&self) -> Option<EvictionReport>;

    /// Replaces the whole namespace with a bundle's contents.
    fn import_data(&self, json: &str) -> ImportResult;

    /// Applies the retention limits to messages and the background gallery.
    fn compress_data(&self) -> bool;

    fn validate_data(&self) -> ValidationReport;

    /// Fixes what `validate_data` reports about messages, then compresses.
    fn repair_data(&self) -> bool;

    /// Session ids that own at least one key.
    fn list_sessions(&self) -> Vec<String>;

    /// Switches the active session.
    fn set_session_id(&self, session_id: &str);
}
