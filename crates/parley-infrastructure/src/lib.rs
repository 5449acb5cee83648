//! Storage areas, the namespaced key-value store, paths and configuration
//! loading for parley.

pub mod config_service;
pub mod eviction;
pub mod kv_store;
pub mod paths;
pub mod session_identity;
pub mod storage;

pub use config_service::ConfigService;
pub use eviction::OldestFraction;
pub use kv_store::{KvStore, KvStoreOptions};
pub use paths::{ParleyPaths, PathError};
pub use session_identity::SessionIdentity;
pub use storage::{FileStorageArea, MemoryStorageArea};
