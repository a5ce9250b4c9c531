//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, in-memory map on native)

pub mod storage;

pub use storage::{KeyValueStore, MemoryStore, StorageFailure};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
