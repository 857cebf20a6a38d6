//! Backup replay engine.
//!
//! Drains the pending message store once at startup. Messages are processed
//! one at a time; each goes through a bounded state machine of availability
//! checks, send attempts and retry decisions before it is deleted from the
//! store.

use std::sync::Arc;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

use super::{MessageOutcome, ReplayReport};
use crate::config::ReplayOptions;
use crate::error::DeliveryError;
use crate::message::{PendingMessage, Topic, TopicName};
use crate::message_store::{MessageStore, StoredMessage};
use crate::metrics::{DropReason, RecoveryMetrics};
use crate::producer::{AsyncSender, DeliveryListener, SendCallback};
use crate::topics::TopicDirectory;
use crate::Result;

/// Per-message replay state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayState {
    AvailabilityWait,
    Sending,
    RetryCheck,
    Done(MessageOutcome),
}

/// Replays backed up messages through an [`AsyncSender`]
pub struct BackupReplayEngine {
    options: ReplayOptions,
    sender: Arc<dyn AsyncSender>,
    directory: Arc<dyn TopicDirectory>,
    listener: Arc<dyn DeliveryListener>,
    metrics: Option<Arc<RecoveryMetrics>>,
}

impl BackupReplayEngine {
    pub fn new(
        options: ReplayOptions,
        sender: Arc<dyn AsyncSender>,
        directory: Arc<dyn TopicDirectory>,
        listener: Arc<dyn DeliveryListener>,
    ) -> Self {
        Self {
            options,
            sender,
            directory,
            listener,
            metrics: None,
        }
    }

    /// Attach a metrics registry
    pub fn with_metrics(mut self, metrics: Arc<RecoveryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn options(&self) -> &ReplayOptions {
        &self.options
    }

    /// Replay every message in `store` and delete each one once resolved.
    ///
    /// Per-message failures never abort the run; only a failure to read the
    /// store is returned as an error.
    pub async fn load_messages(&self, store: &dyn MessageStore) -> Result<ReplayReport> {
        let start = Instant::now();

        self.wait_for_topic_directory().await;

        let messages = store.load_all().await?;
        info!("Loaded {} backed up messages from the message store", messages.len());

        if let Some(metrics) = &self.metrics {
            metrics.set_pending(messages.len());
        }

        let mut report = ReplayReport {
            loaded: messages.len() as u64,
            ..Default::default()
        };

        for stored in &messages {
            let outcome = self.replay_message(stored, &mut report).await;
            report.record(outcome);
            self.record_outcome(&stored.topic, outcome);

            match store.delete(stored.message.id()).await {
                Ok(true) => {}
                Ok(false) => debug!("Message {} was already removed from the store", stored.message.id()),
                Err(e) => {
                    report.delete_failures += 1;
                    error!(
                        "Failed to remove message {} from the store: {}",
                        stored.message.id(),
                        e
                    );
                }
            }
        }

        let elapsed = start.elapsed();
        report.duration_ms = elapsed.as_millis() as u64;
        if let Some(metrics) = &self.metrics {
            metrics.observe_replay_duration(elapsed.as_secs_f64());
        }

        info!("{}", report);
        Ok(report)
    }

    /// Best-effort wait for the topic directory. Never fails.
    async fn wait_for_topic_directory(&self) {
        // None when the wait is too long to represent; poll until ready
        let deadline = Instant::now().checked_add(self.options.topic_directory_wait());
        let interval = self.options.topic_directory_poll_interval();

        loop {
            if self.directory.is_ready().await {
                debug!("Topic directory is ready");
                return;
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(
                            "Topic directory not ready after {}s, loading messages anyway",
                            self.options.wait_for_topic_directory_secs
                        );
                        return;
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };

            sleep(pause).await;
        }
    }

    async fn replay_message(
        &self,
        stored: &StoredMessage,
        report: &mut ReplayReport,
    ) -> MessageOutcome {
        let message = &stored.message;

        let topic = match self.directory.get_topic(&stored.topic).await {
            Some(topic) => topic,
            None => {
                self.report_unknown_topic(message, &stored.topic);
                return MessageOutcome::TopicNotFound;
            }
        };

        // Age is taken against the clock now, not when the store was read
        let now_ms = chrono::Utc::now().timestamp_millis();
        if message.is_stale(self.options.max_message_age_hours, now_ms) {
            info!(
                "Dropping message {} for {}: {}h old, limit is {}h",
                message.id(),
                stored.topic,
                message.age_ms(now_ms) / (60 * 60 * 1000),
                self.options.max_message_age_hours
            );
            return MessageOutcome::Stale;
        }

        let mut failures: u32 = 0;
        let mut state = ReplayState::AvailabilityWait;

        loop {
            state = match state {
                ReplayState::AvailabilityWait => {
                    if self.wait_for_topic_availability(&topic).await {
                        ReplayState::Sending
                    } else {
                        warn!(
                            "{}",
                            DeliveryError::TopicUnavailable {
                                topic: topic.qualified_name(),
                                polls: self.availability_polls(),
                            }
                        );
                        ReplayState::RetryCheck
                    }
                }
                ReplayState::Sending => {
                    report.send_attempts += 1;
                    match self.send(message, &topic).await {
                        Ok(()) => ReplayState::Done(MessageOutcome::Sent {
                            attempts: failures + 1,
                        }),
                        Err(e) => {
                            if let Some(metrics) = &self.metrics {
                                metrics.inc_send_failure(&stored.topic);
                            }
                            self.listener.on_error(message, &topic.name, &e);
                            ReplayState::RetryCheck
                        }
                    }
                }
                ReplayState::RetryCheck => {
                    failures += 1;
                    if failures <= self.options.max_resend_retries {
                        debug!(
                            "Retrying message {} ({}/{})",
                            message.id(),
                            failures,
                            self.options.max_resend_retries
                        );
                        ReplayState::AvailabilityWait
                    } else {
                        error!(
                            "Dropping message {} for {} after {} failed attempts",
                            message.id(),
                            stored.topic,
                            failures
                        );
                        ReplayState::Done(MessageOutcome::RetriesExhausted { attempts: failures })
                    }
                }
                ReplayState::Done(outcome) => return outcome,
            };
        }
    }

    /// Availability checks per attempt. Always at least one, so a fresh
    /// message is never dropped without being offered to the sender.
    fn availability_polls(&self) -> u32 {
        self.options.topic_availability_max_polls.max(1)
    }

    /// Poll the sender until the topic accepts writes, at most
    /// `availability_polls` times.
    async fn wait_for_topic_availability(&self, topic: &Topic) -> bool {
        let max_polls = self.availability_polls();
        let interval = self.options.topic_availability_poll_interval();

        for poll in 1..=max_polls {
            if self.sender.is_topic_available(topic).await {
                return true;
            }
            if poll < max_polls {
                sleep(interval).await;
            }
        }

        false
    }

    /// One send attempt, waiting for its callback or the send timeout
    async fn send(
        &self,
        message: &PendingMessage,
        topic: &Topic,
    ) -> std::result::Result<(), DeliveryError> {
        let (callback, rx) = SendCallback::channel();
        self.sender.send(message.clone(), topic, callback);

        let send_timeout = self.options.send_timeout();
        match timeout(send_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(DeliveryError::CallbackDropped),
            Err(_) => Err(DeliveryError::AckTimeout {
                message_id: message.id().to_string(),
                timeout_ms: send_timeout.as_millis() as u64,
            }),
        }
    }

    fn report_unknown_topic(&self, message: &PendingMessage, qualified_name: &str) {
        let error = DeliveryError::TopicNotFound(qualified_name.to_string());
        match TopicName::from_qualified_name(qualified_name) {
            Ok(name) => self.listener.on_error(message, &name, &error),
            Err(e) => error!(
                "Dropping message {} with unreadable topic key: {}",
                message.id(),
                e
            ),
        }
    }

    fn record_outcome(&self, topic: &str, outcome: MessageOutcome) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        match outcome {
            MessageOutcome::Sent { .. } => metrics.inc_resent(topic),
            MessageOutcome::Stale => metrics.inc_dropped(topic, DropReason::Stale),
            MessageOutcome::TopicNotFound => metrics.inc_dropped(topic, DropReason::TopicNotFound),
            MessageOutcome::RetriesExhausted { .. } => {
                metrics.inc_dropped(topic, DropReason::RetriesExhausted)
            }
        }
    }
}
