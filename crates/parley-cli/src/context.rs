//! Wiring of storage areas, store and services for one CLI invocation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use parley_application::{ChatService, DataManagementService};
use parley_core::config::ParleyConfig;
use parley_infrastructure::{ConfigService, FileStorageArea, KvStore, ParleyPaths};

use crate::terminal::{StdinConfirmer, TerminalNotifier};

pub struct AppContext {
    pub paths: ParleyPaths,
    pub config: ParleyConfig,
    pub store: Arc<KvStore>,
    session_area: Arc<FileStorageArea>,
}

impl AppContext {
    /// Resolves paths, loads `config.toml` and opens both storage areas.
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let paths = ParleyPaths::new(data_dir).context("Failed to resolve the data directory")?;
        let config = ConfigService::new(paths.config_file()).get_config();

        let area = Arc::new(
            FileStorageArea::new(paths.storage_file()).with_quota(config.storage.quota()),
        );
        let session_area = Arc::new(FileStorageArea::new(paths.session_file()));
        let store = Arc::new(KvStore::from_config(area, session_area.clone(), &config));

        tracing::debug!("[CLI] Using data directory {}", paths.base_dir().display());

        Ok(Self {
            paths,
            config,
            store,
            session_area,
        })
    }

    /// A chat service hydrated from the store.
    pub async fn chat(&self) -> ChatService {
        let chat = ChatService::new(self.store.clone(), self.config.chat.clone());
        chat.hydrate().await;
        chat
    }

    pub fn data_management(&self, assume_yes: bool) -> DataManagementService {
        DataManagementService::new(
            self.store.clone(),
            Arc::new(TerminalNotifier),
            Arc::new(StdinConfirmer::new(assume_yes)),
        )
    }

    /// Ends the session-lifetime area; the next run starts a new session.
    pub fn end_session(&self) -> Result<()> {
        self.session_area
            .destroy()
            .context("Failed to end the current session")
    }
}
