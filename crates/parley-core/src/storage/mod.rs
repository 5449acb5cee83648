//! Storage abstractions: storage areas, store capabilities, key layout and
//! the data exchanged through them.

pub mod area;
pub mod bundle;
pub mod capability;
pub mod keys;
pub mod usage;

pub use area::{StorageArea, StorageAreaError};
pub use bundle::{ExportBundle, ImportResult, ImportSummary};
pub use capability::{
    AdminStore, EvictionCandidate, EvictionPolicy, EvictionReport, SessionScopedStore, StoreError,
    ValidationReport,
};
pub use usage::{StorageUsage, UsageItem, format_bytes};
