//! Offset backends for subscription positions.
//!
//! A retransmission writes the same subscription partition offset to every
//! configured backend, in configuration order. Backends are independent: there
//! is no transaction spanning them, and writing the same offset twice must be a
//! no-op.

mod memory;
mod sqlite;

pub use memory::MemoryOffsetBackend;
pub use sqlite::SqliteOffsetBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::subscription::{SubscriptionName, SubscriptionPartitionOffset};
use crate::Result;

/// Stored position of one subscription partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetInfo {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Epoch milliseconds of the last move
    pub updated_at: i64,
}

/// Trait for offset backends
#[async_trait]
pub trait OffsetBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Move a subscription partition to `offset`. Idempotent.
    async fn move_subscription_offset(&self, offset: &SubscriptionPartitionOffset) -> Result<()>;

    /// Current offset of one subscription partition, if any was recorded
    async fn get_offset(
        &self,
        subscription: &SubscriptionName,
        topic: &str,
        partition: i32,
    ) -> Result<Option<i64>>;

    /// All recorded partitions of a subscription, ordered by topic and partition
    async fn get_subscription_offsets(&self, subscription: &SubscriptionName)
        -> Result<Vec<OffsetInfo>>;
}

/// Offset backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum OffsetBackendConfig {
    /// Local SQLite database
    Sqlite {
        /// Path to the database file
        db_path: PathBuf,
    },
    /// In-process map (not persisted)
    Memory,
}

/// Create an offset backend from configuration
pub async fn create_offset_backend(config: &OffsetBackendConfig) -> Result<Arc<dyn OffsetBackend>> {
    match config {
        OffsetBackendConfig::Sqlite { db_path } => {
            Ok(Arc::new(SqliteOffsetBackend::new(db_path.clone()).await?))
        }
        OffsetBackendConfig::Memory => Ok(Arc::new(MemoryOffsetBackend::new())),
    }
}

/// Create every configured backend, keeping configuration order
pub async fn create_offset_backends(
    configs: &[OffsetBackendConfig],
) -> Result<Vec<Arc<dyn OffsetBackend>>> {
    let mut backends = Vec::with_capacity(configs.len());
    for config in configs {
        backends.push(create_offset_backend(config).await?);
    }
    Ok(backends)
}
