//! Prometheus metrics for replay and retransmission.
//!
//! - [`labels`] - Label types for metric dimensions
//! - [`registry`] - The [`RecoveryMetrics`] registry

pub mod labels;
pub mod registry;

pub use labels::{DropLabels, DropReason, OperationStatus, RetransmissionLabels, TopicLabels};
pub use registry::RecoveryMetrics;
