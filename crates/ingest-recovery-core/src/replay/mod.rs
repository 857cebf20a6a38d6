//! Startup replay of backed up messages.

pub mod engine;

pub use engine::BackupReplayEngine;

use serde::{Deserialize, Serialize};
use std::fmt;

/// How processing of a single backed up message ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Broker acknowledged the message on attempt number `attempts`
    Sent { attempts: u32 },
    /// Older than the configured maximum age; never sent
    Stale,
    /// Destination topic unknown to the topic directory
    TopicNotFound,
    /// Every allowed attempt failed
    RetriesExhausted { attempts: u32 },
}

impl MessageOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, MessageOutcome::Sent { .. })
    }
}

/// Summary of a replay run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Messages found in the store
    pub loaded: u64,

    pub sent: u64,

    pub stale: u64,

    pub topic_not_found: u64,

    pub retries_exhausted: u64,

    /// Send calls issued, over all messages
    pub send_attempts: u64,

    /// Resolved messages the store failed to delete
    pub delete_failures: u64,

    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ReplayReport {
    pub fn record(&mut self, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Sent { .. } => self.sent += 1,
            MessageOutcome::Stale => self.stale += 1,
            MessageOutcome::TopicNotFound => self.topic_not_found += 1,
            MessageOutcome::RetriesExhausted { .. } => self.retries_exhausted += 1,
        }
    }

    /// Messages dropped for any reason
    pub fn dropped(&self) -> u64 {
        self.stale + self.topic_not_found + self.retries_exhausted
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Replayed {} backed up messages in {}ms: {} sent, {} stale, {} unknown topic, {} retries exhausted ({} send attempts)",
            self.loaded,
            self.duration_ms,
            self.sent,
            self.stale,
            self.topic_not_found,
            self.retries_exhausted,
            self.send_attempts
        )
    }
}
