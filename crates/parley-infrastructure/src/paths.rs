//! Unified path management for parley data files.
//!
//! Everything lives under one base directory, resolved from an explicit
//! override or the platform data directory.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parley_core::ParleyError;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform data directory could not be determined.
    DataDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::DataDirNotFound => write!(f, "Cannot find data directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for ParleyError {
    fn from(err: PathError) -> Self {
        ParleyError::io(err.to_string())
    }
}

/// Path layout of a parley installation.
///
/// # Directory Structure
///
/// ```text
/// ~/.local/share/parley/       # Base directory (dirs::data_dir default)
/// ├── config.toml              # Application configuration
/// ├── local.json               # Persistent storage area
/// └── session.json             # Session-lifetime area (holds the session id)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParleyPaths {
    base: PathBuf,
}

impl ParleyPaths {
    /// Resolves the base directory.
    ///
    /// # Arguments
    ///
    /// * `base_override` - Use this directory instead of the platform default
    pub fn new(base_override: Option<PathBuf>) -> Result<Self, PathError> {
        let base = match base_override {
            Some(base) => base,
            None => dirs::data_dir()
                .ok_or(PathError::DataDirNotFound)?
                .join("parley"),
        };
        Ok(Self { base })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn storage_file(&self) -> PathBuf {
        self.base.join("local.json")
    }

    pub fn session_file(&self) -> PathBuf {
        self.base.join("session.json")
    }

    /// File name of a backup taken on `date`: `parley-backup-YYYY-MM-DD.json`.
    pub fn backup_file_name(date: NaiveDate) -> String {
        format!("parley-backup-{}.json", date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_layout() {
        let paths = ParleyPaths::new(Some(PathBuf::from("/tmp/parley-test"))).unwrap();
        assert_eq!(paths.base_dir(), Path::new("/tmp/parley-test"));
        assert_eq!(
            paths.storage_file(),
            PathBuf::from("/tmp/parley-test/local.json")
        );
        assert_eq!(
            paths.session_file(),
            PathBuf::from("/tmp/parley-test/session.json")
        );
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/parley-test/config.toml")
        );
    }

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            ParleyPaths::backup_file_name(date),
            "parley-backup-2024-03-07.json"
        );
    }
}
