//! Label types for Prometheus metrics.

use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use std::fmt::Write;

/// Labels for per-topic replay metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TopicLabels {
    pub topic: String,
}

impl TopicLabels {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

/// Labels for dropped messages.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DropLabels {
    pub topic: String,
    pub reason: DropReason,
}

impl DropLabels {
    pub fn new(topic: impl Into<String>, reason: DropReason) -> Self {
        Self {
            topic: topic.into(),
            reason,
        }
    }
}

/// Labels for offset retransmissions.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RetransmissionLabels {
    pub subscription: String,
    pub status: OperationStatus,
}

impl RetransmissionLabels {
    pub fn new(subscription: impl Into<String>, status: OperationStatus) -> Self {
        Self {
            subscription: subscription.into(),
            status,
        }
    }
}

/// Why a backed up message was dropped instead of sent.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum DropReason {
    Stale,
    TopicNotFound,
    RetriesExhausted,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Stale => "stale",
            DropReason::TopicNotFound => "topic_not_found",
            DropReason::RetriesExhausted => "retries_exhausted",
        }
    }
}

impl EncodeLabelValue for DropReason {
    fn encode(
        &self,
        encoder: &mut prometheus_client::encoding::LabelValueEncoder,
    ) -> std::result::Result<(), std::fmt::Error> {
        encoder.write_str(self.as_str())
    }
}

/// Operation status.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    Failure,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Success => "success",
            OperationStatus::Failure => "failure",
        }
    }
}

impl EncodeLabelValue for OperationStatus {
    fn encode(
        &self,
        encoder: &mut prometheus_client::encoding::LabelValueEncoder,
    ) -> std::result::Result<(), std::fmt::Error> {
        encoder.write_str(self.as_str())
    }
}
