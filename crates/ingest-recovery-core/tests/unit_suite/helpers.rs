//! Test helper utilities.
//!
//! Scripted collaborators that record every call made by the code under test.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use ingest_recovery_core::{
    AsyncSender, DeliveryError, DeliveryListener, Error, OffsetBackend, OffsetChangeIndicator,
    OffsetInfo, PartitionOffset, PartitionOffsets, PendingMessage, ReplayOptions, Result,
    SendCallback, StorageError, SubscriptionName, SubscriptionPartitionOffset, Topic, TopicName,
};

pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// Route engine logs to the test harness; `RUST_LOG` selects the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn topic_name() -> TopicName {
    TopicName::from_qualified_name("pl.allegro.tech.hermes.test").unwrap()
}

pub fn topic() -> Topic {
    Topic::new(topic_name())
}

/// A message created `age_hours` before now
pub fn message_of_age(id: &str, age_hours: i64) -> PendingMessage {
    PendingMessage::new(
        id,
        "{'a':'b'}",
        chrono::Utc::now().timestamp_millis() - age_hours * HOUR_MS,
    )
}

/// Replay options with millisecond poll intervals
pub fn replay_options(max_message_age_hours: u32, max_resend_retries: u32) -> ReplayOptions {
    ReplayOptions {
        wait_for_topic_directory_secs: 5,
        max_message_age_hours,
        max_resend_retries,
        topic_directory_poll_interval_ms: 1,
        topic_availability_poll_interval_ms: 1,
        topic_availability_max_polls: 10,
        send_timeout_secs: 5,
    }
}

/// How the scripted sender completes each callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBehaviour {
    AlwaysSucceed,
    AlwaysFail,
    /// Fail the first `n` sends, then succeed
    FailFirst(u32),
}

/// Sender with scripted availability answers and send outcomes
pub struct ScriptedSender {
    behaviour: SendBehaviour,
    /// Answers for successive availability checks; `true` once exhausted
    availability: Mutex<VecDeque<bool>>,
    pub availability_checks: AtomicU32,
    pub sends: AtomicU32,
    /// Ids of sent messages, in send order
    pub sent_ids: Mutex<Vec<String>>,
}

impl ScriptedSender {
    pub fn new(behaviour: SendBehaviour) -> Self {
        Self {
            behaviour,
            availability: Mutex::new(VecDeque::new()),
            availability_checks: AtomicU32::new(0),
            sends: AtomicU32::new(0),
            sent_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn with_availability(self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.availability.lock().extend(answers);
        self
    }

    /// Availability answers for every check, forever
    pub fn unavailable(self) -> Self {
        self.with_availability(std::iter::repeat(false).take(10_000))
    }

    pub fn send_count(&self) -> u32 {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn availability_check_count(&self) -> u32 {
        self.availability_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AsyncSender for ScriptedSender {
    async fn is_topic_available(&self, _topic: &Topic) -> bool {
        self.availability_checks.fetch_add(1, Ordering::SeqCst);
        self.availability.lock().pop_front().unwrap_or(true)
    }

    fn send(&self, message: PendingMessage, _topic: &Topic, callback: SendCallback) {
        let attempt = self.sends.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent_ids.lock().push(message.id().to_string());

        let fail = match self.behaviour {
            SendBehaviour::AlwaysSucceed => false,
            SendBehaviour::AlwaysFail => true,
            SendBehaviour::FailFirst(n) => attempt <= n,
        };

        // Complete from another task, like a real producer's I/O thread
        tokio::spawn(async move {
            if fail {
                callback.on_unpublished(DeliveryError::Broker("test".to_string()));
            } else {
                callback.on_published();
            }
        });
    }
}

/// Listener that keeps every notification
#[derive(Default)]
pub struct RecordingListener {
    pub errors: Mutex<Vec<(String, TopicName, DeliveryError)>>,
}

impl RecordingListener {
    pub fn count(&self) -> usize {
        self.errors.lock().len()
    }
}

impl DeliveryListener for RecordingListener {
    fn on_error(&self, message: &PendingMessage, topic: &TopicName, error: &DeliveryError) {
        self.errors
            .lock()
            .push((message.id().to_string(), topic.clone(), error.clone()));
    }
}

/// One recorded backend write: (backend, partition, offset)
pub type MoveRecord = (String, i32, i64);

/// Offset backend appending every move to a log shared between backends
pub struct RecordingBackend {
    name: String,
    log: Arc<Mutex<Vec<MoveRecord>>>,
    fail_on_partition: Option<i32>,
}

impl RecordingBackend {
    pub fn new(name: &str, log: Arc<Mutex<Vec<MoveRecord>>>) -> Self {
        Self {
            name: name.to_string(),
            log,
            fail_on_partition: None,
        }
    }

    pub fn failing_on(mut self, partition: i32) -> Self {
        self.fail_on_partition = Some(partition);
        self
    }
}

#[async_trait]
impl OffsetBackend for RecordingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn move_subscription_offset(&self, offset: &SubscriptionPartitionOffset) -> Result<()> {
        if self.fail_on_partition == Some(offset.partition()) {
            return Err(StorageError::Backend(format!("{} is read-only", self.name)).into());
        }
        self.log
            .lock()
            .push((self.name.clone(), offset.partition(), offset.offset()));
        Ok(())
    }

    async fn get_offset(
        &self,
        _subscription: &SubscriptionName,
        _topic: &str,
        partition: i32,
    ) -> Result<Option<i64>> {
        Ok(self
            .log
            .lock()
            .iter()
            .rev()
            .find(|(name, p, _)| *name == self.name && *p == partition)
            .map(|(_, _, offset)| *offset))
    }

    async fn get_subscription_offsets(
        &self,
        _subscription: &SubscriptionName,
    ) -> Result<Vec<OffsetInfo>> {
        Ok(Vec::new())
    }
}

/// Indicator returning a fixed set of offsets, or failing
pub struct StaticIndicator {
    offsets: Option<PartitionOffsets>,
    pub calls: Mutex<Vec<(String, String, String)>>,
}

impl StaticIndicator {
    pub fn returning(offsets: Vec<PartitionOffset>) -> Self {
        Self {
            offsets: Some(PartitionOffsets::from(offsets)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            offsets: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OffsetChangeIndicator for StaticIndicator {
    async fn get_subscription_offsets(
        &self,
        topic: &TopicName,
        subscription: &str,
        cluster: &str,
    ) -> Result<PartitionOffsets> {
        self.calls.lock().push((
            topic.qualified_name(),
            subscription.to_string(),
            cluster.to_string(),
        ));
        self.offsets
            .clone()
            .ok_or_else(|| Error::Storage(StorageError::Backend("indicator unreachable".to_string())))
    }

    async fn set_subscription_offset(
        &self,
        _topic: &TopicName,
        _subscription: &str,
        _cluster: &str,
        _offset: &PartitionOffset,
    ) -> Result<()> {
        Ok(())
    }
}
