//! Storage area implementations.

mod file_area;
mod memory_area;

pub use file_area::FileStorageArea;
pub use memory_area::MemoryStorageArea;
