//! Ingest Recovery Core Library
//!
//! Durability and recovery for a message ingestion front-end: replays messages
//! that were backed up locally when the broker could not confirm them, and
//! re-synchronizes subscription offsets across offset backends after an
//! operator requests a retransmission.

pub mod config;
pub mod error;
pub mod message;
pub mod message_store;
pub mod metrics;
pub mod offset_store;
pub mod producer;
pub mod replay;
pub mod retransmit;
pub mod storage;
pub mod subscription;
pub mod topics;

pub use config::{Config, MessageStoreConfig, OffsetIndicatorConfig, ReplayOptions};
pub use error::{DeliveryError, Error, Result, StorageError};
pub use message::{Ack, ContentType, PendingMessage, Topic, TopicName};
pub use message_store::{
    create_message_store, MemoryMessageStore, MessageStore, SqliteMessageStore, StoredMessage,
};
pub use metrics::RecoveryMetrics;
pub use offset_store::{
    create_offset_backends, MemoryOffsetBackend, OffsetBackend, OffsetBackendConfig, OffsetInfo,
    SqliteOffsetBackend,
};
pub use producer::{
    AsyncSender, DeliveryListener, DeliveryListeners, LoggingDeliveryListener, SendCallback,
    SendOutcome,
};
pub use replay::{BackupReplayEngine, MessageOutcome, ReplayReport};
pub use retransmit::{
    OffsetChangeIndicator, OffsetRetransmitter, RetransmissionReport, StorageOffsetChangeIndicator,
};
pub use subscription::{
    PartitionOffset, PartitionOffsets, SubscriptionName, SubscriptionPartition,
    SubscriptionPartitionOffset,
};
pub use topics::{InMemoryTopicDirectory, TopicDirectory};
