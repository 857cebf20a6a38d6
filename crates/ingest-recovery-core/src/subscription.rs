//! Subscription and partition offset value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::message::TopicName;
use crate::{Error, Result};

/// Separator between the topic and the subscription in the textual form.
const SUBSCRIPTION_SEPARATOR: char = '$';

/// Compound subscription identifier: `group.topic$subscription`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubscriptionName {
    topic_name: TopicName,
    name: String,
}

impl SubscriptionName {
    pub fn new(topic_name: TopicName, name: impl Into<String>) -> Self {
        Self {
            topic_name,
            name: name.into(),
        }
    }

    pub fn topic_name(&self) -> &TopicName {
        &self.topic_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse `group.topic$subscription`.
    pub fn from_string(value: &str) -> Result<Self> {
        let (topic, name) = value.split_once(SUBSCRIPTION_SEPARATOR).ok_or_else(|| {
            Error::InvalidName(format!(
                "'{}' is not a subscription name (expected group.topic${{subscription}})",
                value
            ))
        })?;

        if name.is_empty() {
            return Err(Error::InvalidName(format!(
                "'{}' has an empty subscription part",
                value
            )));
        }

        Ok(Self::new(TopicName::from_qualified_name(topic)?, name))
    }
}

impl fmt::Display for SubscriptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.topic_name, SUBSCRIPTION_SEPARATOR, self.name)
    }
}

impl FromStr for SubscriptionName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl TryFrom<String> for SubscriptionName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_string(&value)
    }
}

impl From<SubscriptionName> for String {
    fn from(value: SubscriptionName) -> Self {
        value.to_string()
    }
}

/// Target offset for a single partition, as recorded by the offset change indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionOffset {
    /// Broker-level topic the partition belongs to
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl PartitionOffset {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }
}

/// Ordered collection of partition offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionOffsets(Vec<PartitionOffset>);

impl PartitionOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, offset: PartitionOffset) {
        self.0.push(offset);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PartitionOffset> {
        self.0.iter()
    }
}

impl From<Vec<PartitionOffset>> for PartitionOffsets {
    fn from(offsets: Vec<PartitionOffset>) -> Self {
        Self(offsets)
    }
}

impl FromIterator<PartitionOffset> for PartitionOffsets {
    fn from_iter<I: IntoIterator<Item = PartitionOffset>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PartitionOffsets {
    type Item = PartitionOffset;
    type IntoIter = std::vec::IntoIter<PartitionOffset>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PartitionOffsets {
    type Item = &'a PartitionOffset;
    type IntoIter = std::slice::Iter<'a, PartitionOffset>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One partition of one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionPartition {
    topic: String,
    subscription_name: SubscriptionName,
    partition: i32,
}

impl SubscriptionPartition {
    pub fn new(topic: impl Into<String>, subscription_name: SubscriptionName, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            subscription_name,
            partition,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subscription_name(&self) -> &SubscriptionName {
        &self.subscription_name
    }

    pub fn partition(&self) -> i32 {
        self.partition
    }
}

/// The unit written to every offset backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPartitionOffset {
    subscription_partition: SubscriptionPartition,
    offset: i64,
}

impl SubscriptionPartitionOffset {
    pub fn new(subscription_partition: SubscriptionPartition, offset: i64) -> Self {
        Self {
            subscription_partition,
            offset,
        }
    }

    /// Bind an indicator entry to the subscription it was recorded for.
    pub fn from_partition_offset(
        subscription_name: &SubscriptionName,
        partition_offset: &PartitionOffset,
    ) -> Self {
        Self::new(
            SubscriptionPartition::new(
                partition_offset.topic.clone(),
                subscription_name.clone(),
                partition_offset.partition,
            ),
            partition_offset.offset,
        )
    }

    pub fn subscription_partition(&self) -> &SubscriptionPartition {
        &self.subscription_partition
    }

    pub fn topic(&self) -> &str {
        self.subscription_partition.topic()
    }

    pub fn subscription_name(&self) -> &SubscriptionName {
        self.subscription_partition.subscription_name()
    }

    pub fn partition(&self) -> i32 {
        self.subscription_partition.partition()
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}
