//! Prometheus metrics registry for backup replay and offset retransmission.

use parking_lot::RwLock;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

use super::labels::{DropLabels, DropReason, OperationStatus, RetransmissionLabels, TopicLabels};

/// Recovery metrics registry.
pub struct RecoveryMetrics {
    registry: RwLock<Registry>,

    /// Backed up messages delivered on replay.
    pub messages_resent_total: Family<TopicLabels, Counter>,

    /// Backed up messages dropped, by reason.
    pub messages_dropped_total: Family<DropLabels, Counter>,

    /// Failed send attempts (each one is also reported to the delivery listener).
    pub send_failures_total: Family<TopicLabels, Counter>,

    /// Messages found in the store when replay started.
    pub pending_messages: Gauge,

    /// Wall time of a full replay run.
    pub replay_duration_seconds: Histogram,

    /// Offset retransmissions by outcome.
    pub retransmissions_total: Family<RetransmissionLabels, Counter>,

    /// Individual backend writes issued by retransmissions.
    pub offset_moves_total: Counter,
}

impl Default for RecoveryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let messages_resent_total = Family::<TopicLabels, Counter>::default();
        let messages_dropped_total = Family::<DropLabels, Counter>::default();
        let send_failures_total = Family::<TopicLabels, Counter>::default();
        let pending_messages = Gauge::default();
        // 0.1s .. ~30min
        let replay_duration_seconds = Histogram::new(exponential_buckets(0.1, 2.0, 15));
        let retransmissions_total = Family::<RetransmissionLabels, Counter>::default();
        let offset_moves_total = Counter::default();

        registry.register(
            "ingest_backup_messages_resent",
            "Backed up messages delivered on replay",
            messages_resent_total.clone(),
        );
        registry.register(
            "ingest_backup_messages_dropped",
            "Backed up messages dropped without delivery",
            messages_dropped_total.clone(),
        );
        registry.register(
            "ingest_backup_send_failures",
            "Failed send attempts while replaying backed up messages",
            send_failures_total.clone(),
        );
        registry.register(
            "ingest_backup_pending_messages",
            "Messages found in the backup store at replay start",
            pending_messages.clone(),
        );
        registry.register(
            "ingest_backup_replay_duration_seconds",
            "Duration of a backup replay run",
            replay_duration_seconds.clone(),
        );
        registry.register(
            "ingest_offset_retransmissions",
            "Offset retransmissions by status",
            retransmissions_total.clone(),
        );
        registry.register(
            "ingest_offset_moves",
            "Subscription offset writes issued to offset backends",
            offset_moves_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            messages_resent_total,
            messages_dropped_total,
            send_failures_total,
            pending_messages,
            replay_duration_seconds,
            retransmissions_total,
            offset_moves_total,
        }
    }

    pub fn inc_resent(&self, topic: &str) {
        self.messages_resent_total
            .get_or_create(&TopicLabels::new(topic))
            .inc();
    }

    pub fn inc_dropped(&self, topic: &str, reason: DropReason) {
        self.messages_dropped_total
            .get_or_create(&DropLabels::new(topic, reason))
            .inc();
    }

    pub fn inc_send_failure(&self, topic: &str) {
        self.send_failures_total
            .get_or_create(&TopicLabels::new(topic))
            .inc();
    }

    pub fn set_pending(&self, count: usize) {
        self.pending_messages.set(count as i64);
    }

    pub fn observe_replay_duration(&self, seconds: f64) {
        self.replay_duration_seconds.observe(seconds);
    }

    pub fn record_retransmission(&self, subscription: &str, status: OperationStatus) {
        self.retransmissions_total
            .get_or_create(&RetransmissionLabels::new(subscription, status))
            .inc();
    }

    pub fn inc_offset_moves(&self, count: u64) {
        self.offset_moves_total.inc_by(count);
    }

    /// Encode all metrics in Prometheus text format.
    pub fn encode(&self) -> String {
        let registry = self.registry.read();
        let mut buffer = String::new();
        if encode(&mut buffer, &registry).is_err() {
            return String::new();
        }
        buffer
    }
}
