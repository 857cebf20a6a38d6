//! Storage backend abstraction and implementations.
//!
//! Backs the offset change indicator. Two backends are available:
//!
//! - **Filesystem**: one file per key under a base directory
//! - **Memory**: in-process map (for testing)

mod backend;
mod filesystem;
mod memory;

pub use backend::StorageBackend;
pub use filesystem::FilesystemBackend;
pub use memory::MemoryBackend;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageBackendConfig {
    /// Local filesystem
    Filesystem {
        /// Base directory for all keys
        path: PathBuf,
    },
    /// In-memory storage (not persisted)
    Memory,
}

/// Create a storage backend from configuration.
pub fn create_backend(config: &StorageBackendConfig) -> Arc<dyn StorageBackend> {
    match config {
        StorageBackendConfig::Filesystem { path } => Arc::new(FilesystemBackend::new(path.clone())),
        StorageBackendConfig::Memory => Arc::new(MemoryBackend::new()),
    }
}
