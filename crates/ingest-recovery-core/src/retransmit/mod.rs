//! Operator-triggered offset retransmission.
//!
//! An operator records target offsets for a subscription in the offset change
//! indicator; [`OffsetRetransmitter::reload_offsets`] then copies them to every
//! configured offset backend.

mod indicator;
mod retransmitter;

pub use indicator::StorageOffsetChangeIndicator;
pub use retransmitter::{OffsetRetransmitter, RetransmissionReport};

use async_trait::async_trait;

use crate::message::TopicName;
use crate::subscription::{PartitionOffset, PartitionOffsets};
use crate::Result;

/// Source of the offsets a subscription should be moved to
#[async_trait]
pub trait OffsetChangeIndicator: Send + Sync {
    /// Offsets recorded for `subscription` on `topic` in `cluster`, ordered by partition
    async fn get_subscription_offsets(
        &self,
        topic: &TopicName,
        subscription: &str,
        cluster: &str,
    ) -> Result<PartitionOffsets>;

    /// Record a target offset for one partition, replacing any earlier request
    async fn set_subscription_offset(
        &self,
        topic: &TopicName,
        subscription: &str,
        cluster: &str,
        offset: &PartitionOffset,
    ) -> Result<()>;
}
