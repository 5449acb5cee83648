//! Configuration service implementation.
//!
//! Loads `ParleyConfig` from `config.toml` and caches it. A missing file means
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use parley_core::Result;
use parley_core::config::ParleyConfig;

/// Configuration service that loads and caches the configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<ParleyConfig>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// An unreadable or invalid file is logged and replaced by defaults.
    pub fn get_config(&self) -> ParleyConfig {
        if let Ok(guard) = self.config.read() {
            if let Some(cached) = guard.as_ref() {
                return cached.clone();
            }
        }

        let loaded = match self.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "[Config] Failed to load {}: {}. Using defaults",
                    self.path.display(),
                    e
                );
                ParleyConfig::default()
            }
        };

        if let Ok(mut guard) = self.config.write() {
            *guard = Some(loaded.clone());
        }
        loaded
    }

    /// Reads and validates the file without touching the cache.
    pub fn load(&self) -> Result<ParleyConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[Config] {} not found, using defaults",
                self.path.display()
            );
            return Ok(ParleyConfig::default());
        }
        let content = fs::read_to_string(&self.path)?;
        ParleyConfig::from_toml_str(&content)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut guard) = self.config.write() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));
        assert_eq!(service.get_config(), ParleyConfig::default());
    }

    #[test]
    fn test_reads_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[chat]\nhistory_batch_size = 20\n").unwrap();

        let service = ConfigService::new(&path);
        assert_eq!(service.get_config().chat.history_batch_size, 20);

        fs::write(&path, "[chat]\nhistory_batch_size = 30\n").unwrap();
        assert_eq!(service.get_config().chat.history_batch_size, 20);

        service.invalidate_cache();
        assert_eq!(service.get_config().chat.history_batch_size, 30);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[eviction]\nfraction = 3.0\n").unwrap();

        let service = ConfigService::new(&path);
        assert!(service.load().is_err());
        assert_eq!(service.get_config(), ParleyConfig::default());
    }
}
