//! In-memory offset backend (for testing).

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{OffsetBackend, OffsetInfo};
use crate::subscription::{SubscriptionName, SubscriptionPartitionOffset};
use crate::Result;

/// (subscription, topic, partition) -> (offset, updated_at)
type OffsetMap = BTreeMap<(String, String, i32), (i64, i64)>;

/// In-memory offset backend
#[derive(Debug, Default)]
pub struct MemoryOffsetBackend {
    offsets: RwLock<OffsetMap>,
}

impl MemoryOffsetBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded subscription partitions
    pub fn len(&self) -> usize {
        self.offsets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.read().is_empty()
    }
}

#[async_trait]
impl OffsetBackend for MemoryOffsetBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn move_subscription_offset(&self, offset: &SubscriptionPartitionOffset) -> Result<()> {
        self.offsets.write().insert(
            (
                offset.subscription_name().to_string(),
                offset.topic().to_string(),
                offset.partition(),
            ),
            (offset.offset(), chrono::Utc::now().timestamp_millis()),
        );
        Ok(())
    }

    async fn get_offset(
        &self,
        subscription: &SubscriptionName,
        topic: &str,
        partition: i32,
    ) -> Result<Option<i64>> {
        Ok(self
            .offsets
            .read()
            .get(&(subscription.to_string(), topic.to_string(), partition))
            .map(|(offset, _)| *offset))
    }

    async fn get_subscription_offsets(
        &self,
        subscription: &SubscriptionName,
    ) -> Result<Vec<OffsetInfo>> {
        let key = subscription.to_string();
        Ok(self
            .offsets
            .read()
            .iter()
            .filter(|((sub, _, _), _)| *sub == key)
            .map(|((_, topic, partition), (offset, updated_at))| OffsetInfo {
                topic: topic.clone(),
                partition: *partition,
                offset: *offset,
                updated_at: *updated_at,
            })
            .collect())
    }
}
