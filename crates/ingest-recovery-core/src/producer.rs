//! Sender and delivery listener seams used by the replay engine.
//!
//! The sender is callback based: `send` returns immediately and the outcome is
//! reported later through a [`SendCallback`]. The callback owns the sending half
//! of a oneshot channel, so it can be completed at most once, from any task.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::DeliveryError;
use crate::message::{PendingMessage, Topic, TopicName};

/// Result of one send attempt
pub type SendOutcome = std::result::Result<(), DeliveryError>;

/// Completion handle for a single send attempt
#[derive(Debug)]
pub struct SendCallback {
    tx: oneshot::Sender<SendOutcome>,
}

impl SendCallback {
    /// Create a callback and the receiver that observes its completion
    pub fn channel() -> (Self, oneshot::Receiver<SendOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Report that the broker acknowledged the message
    pub fn on_published(self) {
        // Receiver gone means the attempt already timed out
        let _ = self.tx.send(Ok(()));
    }

    /// Report that the send failed
    pub fn on_unpublished(self, error: DeliveryError) {
        let _ = self.tx.send(Err(error));
    }

    /// Complete with an already computed outcome
    pub fn complete(self, outcome: SendOutcome) {
        let _ = self.tx.send(outcome);
    }
}

/// Non-blocking producer to the backing log
#[async_trait]
pub trait AsyncSender: Send + Sync {
    /// Whether the destination currently accepts writes
    async fn is_topic_available(&self, topic: &Topic) -> bool;

    /// Start sending `message`. Must not block; the callback is completed
    /// exactly once, possibly on another task.
    fn send(&self, message: PendingMessage, topic: &Topic, callback: SendCallback);
}

/// Sink for per-attempt delivery errors
pub trait DeliveryListener: Send + Sync {
    fn on_error(&self, message: &PendingMessage, topic: &TopicName, error: &DeliveryError);
}

/// Writes every delivery error to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDeliveryListener;

impl DeliveryListener for LoggingDeliveryListener {
    fn on_error(&self, message: &PendingMessage, topic: &TopicName, error: &DeliveryError) {
        warn!(
            message_id = message.id(),
            topic = %topic,
            error = %error,
            "Failed to deliver backed up message"
        );
    }
}

/// Fans notifications out to several listeners, in registration order
#[derive(Default, Clone)]
pub struct DeliveryListeners {
    listeners: Vec<Arc<dyn DeliveryListener>>,
}

impl DeliveryListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, listener: Arc<dyn DeliveryListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn register(&mut self, listener: Arc<dyn DeliveryListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl DeliveryListener for DeliveryListeners {
    fn on_error(&self, message: &PendingMessage, topic: &TopicName, error: &DeliveryError) {
        for listener in &self.listeners {
            listener.on_error(message, topic, error);
        }
    }
}
