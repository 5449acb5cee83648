pub mod chat;
pub mod config;
pub mod error;
pub mod id;
pub mod notify;
pub mod storage;

// Re-export common error type
pub use error::{ParleyError, Result};
