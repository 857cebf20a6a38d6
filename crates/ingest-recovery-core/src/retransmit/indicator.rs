//! Offset change indicator backed by a [`StorageBackend`].
//!
//! Each partition request is one JSON document at
//! `{prefix}/{group.topic}/{subscription}/{cluster}/{partition}.json`.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info};

use super::OffsetChangeIndicator;
use crate::message::TopicName;
use crate::storage::StorageBackend;
use crate::subscription::{PartitionOffset, PartitionOffsets};
use crate::Result;

/// Offset change indicator storing one document per partition
pub struct StorageOffsetChangeIndicator {
    backend: Arc<dyn StorageBackend>,
    prefix: String,
}

impl StorageOffsetChangeIndicator {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_prefix(backend, "retransmission".to_string())
    }

    pub fn with_prefix(backend: Arc<dyn StorageBackend>, prefix: String) -> Self {
        Self {
            backend,
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    fn subscription_path(&self, topic: &TopicName, subscription: &str, cluster: &str) -> String {
        format!(
            "{}/{}/{}/{}/",
            self.prefix,
            topic.qualified_name(),
            subscription,
            cluster
        )
    }

    fn partition_path(
        &self,
        topic: &TopicName,
        subscription: &str,
        cluster: &str,
        partition: i32,
    ) -> String {
        format!(
            "{}{}.json",
            self.subscription_path(topic, subscription, cluster),
            partition
        )
    }
}

#[async_trait]
impl OffsetChangeIndicator for StorageOffsetChangeIndicator {
    async fn get_subscription_offsets(
        &self,
        topic: &TopicName,
        subscription: &str,
        cluster: &str,
    ) -> Result<PartitionOffsets> {
        let keys = self
            .backend
            .list(&self.subscription_path(topic, subscription, cluster))
            .await?;

        let mut offsets = Vec::with_capacity(keys.len());
        for key in keys.iter().filter(|k| k.ends_with(".json")) {
            let data = self.backend.get(key).await?;
            let offset: PartitionOffset = serde_json::from_slice(&data)?;
            offsets.push(offset);
        }
        offsets.sort_by_key(|o| o.partition);

        debug!(
            "Read {} partition offsets for {}${} in {}",
            offsets.len(),
            topic,
            subscription,
            cluster
        );
        Ok(PartitionOffsets::from(offsets))
    }

    async fn set_subscription_offset(
        &self,
        topic: &TopicName,
        subscription: &str,
        cluster: &str,
        offset: &PartitionOffset,
    ) -> Result<()> {
        let path = self.partition_path(topic, subscription, cluster, offset.partition);
        let json = serde_json::to_vec_pretty(offset)?;
        self.backend.put(&path, Bytes::from(json)).await?;

        info!(
            "Requested offset {} for {}${} partition {} in {}",
            offset.offset, topic, subscription, offset.partition, cluster
        );
        Ok(())
    }
}
