//! Durable store for messages awaiting confirmed delivery.
//!
//! Messages land here when the broker could not acknowledge them. On the next
//! start the replay engine reads everything back in storage order and deletes
//! each message once it has been sent or dropped, so a restart never replays a
//! message that was already handed off.

mod memory;
mod sqlite;

pub use memory::MemoryMessageStore;
pub use sqlite::SqliteMessageStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::MessageStoreConfig;
use crate::message::{PendingMessage, TopicName};
use crate::Result;

/// A persisted message together with the topic key captured when it was saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub message: PendingMessage,
    /// Qualified topic name as given to `save`
    pub topic: String,
}

/// Trait for pending message stores
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message for `topic`. Saving the same message id twice keeps
    /// its original position in storage order.
    async fn save(&self, message: &PendingMessage, topic: &TopicName) -> Result<()>;

    /// All stored messages in storage order
    async fn load_all(&self) -> Result<Vec<StoredMessage>>;

    /// Remove a message once it is resolved. Returns false if it was not stored.
    async fn delete(&self, message_id: &str) -> Result<bool>;

    /// Number of stored messages
    async fn count(&self) -> Result<u64>;
}

/// Create a message store from configuration
pub async fn create_message_store(config: &MessageStoreConfig) -> Result<Arc<dyn MessageStore>> {
    match config {
        MessageStoreConfig::Sqlite { db_path } => {
            Ok(Arc::new(SqliteMessageStore::new(db_path.clone()).await?))
        }
        MessageStoreConfig::Memory => Ok(Arc::new(MemoryMessageStore::new())),
    }
}
