//! Error types for the ingest recovery core library.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ingest recovery library.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed topic or subscription identifier
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Offset retransmission failed; wraps whatever broke first
    #[error("Retransmission of offsets for {subscription} failed: {source}")]
    Retransmission {
        subscription: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error raised while reloading offsets for a subscription.
    pub fn retransmission(subscription: impl Into<String>, source: Error) -> Self {
        Error::Retransmission {
            subscription: subscription.into(),
            source: Box::new(source),
        }
    }
}

/// Errors reported for a single delivery attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeliveryError {
    /// Broker rejected or failed the produce
    #[error("Broker error: {0}")]
    Broker(String),

    /// Topic metadata is unknown to the topic directory
    #[error("Topic {0} is not known to the topic directory")]
    TopicNotFound(String),

    /// Destination never reported ready while polling
    #[error("Topic {topic} unavailable after {polls} availability checks")]
    TopicUnavailable { topic: String, polls: u32 },

    /// No acknowledgement arrived within the send timeout
    #[error("No acknowledgement for message {message_id} within {timeout_ms}ms")]
    AckTimeout { message_id: String, timeout_ms: u64 },

    /// Sender dropped the callback without completing it
    #[error("Send callback dropped without a result")]
    CallbackDropped,
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Storage backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Storage(StorageError::Backend(err.to_string()))
    }
}
