//! Fan-out of indicator offsets to every offset backend.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use super::OffsetChangeIndicator;
use crate::metrics::{OperationStatus, RecoveryMetrics};
use crate::offset_store::OffsetBackend;
use crate::subscription::{SubscriptionName, SubscriptionPartitionOffset};
use crate::{Error, Result};

/// Result of a successful retransmission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetransmissionReport {
    pub subscription: String,
    /// Partitions returned by the indicator
    pub partitions: usize,
    /// Backend writes issued (partitions x backends)
    pub writes: usize,
}

/// Copies requested offsets to every configured offset backend
pub struct OffsetRetransmitter {
    indicator: Arc<dyn OffsetChangeIndicator>,
    backends: Vec<Arc<dyn OffsetBackend>>,
    cluster_name: String,
    metrics: Option<Arc<RecoveryMetrics>>,
}

impl OffsetRetransmitter {
    pub fn new(
        indicator: Arc<dyn OffsetChangeIndicator>,
        backends: Vec<Arc<dyn OffsetBackend>>,
        cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            indicator,
            backends,
            cluster_name: cluster_name.into(),
            metrics: None,
        }
    }

    /// Attach a metrics registry
    pub fn with_metrics(mut self, metrics: Arc<RecoveryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn backends(&self) -> &[Arc<dyn OffsetBackend>] {
        &self.backends
    }

    /// Move `subscription` to the offsets recorded in the indicator.
    ///
    /// Partitions are applied one at a time, each to every backend in order.
    /// The first failure stops the run and is returned wrapped in
    /// [`Error::Retransmission`]; writes already issued are not rolled back.
    pub async fn reload_offsets(
        &self,
        subscription: &SubscriptionName,
    ) -> Result<RetransmissionReport> {
        info!("Reloading offsets for {}", subscription);

        let mut writes = 0;
        let result = self.move_offsets(subscription, &mut writes).await;

        if let Some(metrics) = &self.metrics {
            metrics.inc_offset_moves(writes as u64);
        }

        match result {
            Ok(partitions) => {
                self.record(subscription, OperationStatus::Success);
                info!(
                    "Reloaded {} partition offsets for {} into {} backends",
                    partitions,
                    subscription,
                    self.backends.len()
                );
                Ok(RetransmissionReport {
                    subscription: subscription.to_string(),
                    partitions,
                    writes,
                })
            }
            Err(e) => {
                self.record(subscription, OperationStatus::Failure);
                error!(
                    "Retransmission for {} failed after {} backend writes: {}",
                    subscription, writes, e
                );
                Err(Error::retransmission(subscription.to_string(), e))
            }
        }
    }

    async fn move_offsets(
        &self,
        subscription: &SubscriptionName,
        writes: &mut usize,
    ) -> Result<usize> {
        let offsets = self
            .indicator
            .get_subscription_offsets(
                subscription.topic_name(),
                subscription.name(),
                &self.cluster_name,
            )
            .await?;

        for partition_offset in &offsets {
            let offset =
                SubscriptionPartitionOffset::from_partition_offset(subscription, partition_offset);

            for backend in &self.backends {
                backend.move_subscription_offset(&offset).await?;
                *writes += 1;
            }
        }

        Ok(offsets.len())
    }

    fn record(&self, subscription: &SubscriptionName, status: OperationStatus) {
        if let Some(metrics) = &self.metrics {
            metrics.record_retransmission(&subscription.to_string(), status);
        }
    }
}
