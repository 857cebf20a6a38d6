//! In-memory message store for tests and ephemeral deployments.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MessageStore, StoredMessage};
use crate::message::{PendingMessage, TopicName};
use crate::Result;

/// Message store that keeps everything in process memory
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: Mutex<Vec<StoredMessage>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn save(&self, message: &PendingMessage, topic: &TopicName) -> Result<()> {
        let stored = StoredMessage {
            message: message.clone(),
            topic: topic.qualified_name(),
        };

        let mut messages = self.messages.lock();
        match messages.iter_mut().find(|m| m.message.id() == message.id()) {
            Some(existing) => *existing = stored,
            None => messages.push(stored),
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredMessage>> {
        Ok(self.messages.lock().clone())
    }

    async fn delete(&self, message_id: &str) -> Result<bool> {
        let mut messages = self.messages.lock();
        let before = messages.len();
        messages.retain(|m| m.message.id() != message_id);
        Ok(messages.len() != before)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.messages.lock().len() as u64)
    }
}
