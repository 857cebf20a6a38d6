//! Configuration structures for backup replay and offset retransmission.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::offset_store::OffsetBackendConfig;
use crate::storage::StorageBackendConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Broker cluster whose offsets are fetched during retransmission
    pub cluster_name: String,

    /// Backup replay options
    #[serde(default)]
    pub replay: ReplayOptions,

    /// Local store for messages awaiting delivery
    #[serde(default)]
    pub message_store: MessageStoreConfig,

    /// Offset backends, written in the listed order
    #[serde(default)]
    pub offset_backends: Vec<OffsetBackendConfig>,

    /// Where retransmission requests are recorded
    #[serde(default)]
    pub offset_indicator: OffsetIndicatorConfig,
}

/// Backup replay options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOptions {
    /// Seconds to wait for the topic directory to become ready (default: 120)
    #[serde(default = "default_wait_for_topic_directory_secs")]
    pub wait_for_topic_directory_secs: u64,

    /// Messages older than this are dropped without sending (default: 72)
    #[serde(default = "default_max_message_age_hours")]
    pub max_message_age_hours: u32,

    /// Additional attempts after the first send (default: 5)
    #[serde(default = "default_max_resend_retries")]
    pub max_resend_retries: u32,

    /// Poll interval while waiting for the topic directory (default: 100ms)
    #[serde(default = "default_topic_directory_poll_interval_ms")]
    pub topic_directory_poll_interval_ms: u64,

    /// Backoff between topic availability checks (default: 500ms)
    #[serde(default = "default_topic_availability_poll_interval_ms")]
    pub topic_availability_poll_interval_ms: u64,

    /// Availability checks per attempt before giving up (default: 20)
    #[serde(default = "default_topic_availability_max_polls")]
    pub topic_availability_max_polls: u32,

    /// Seconds to wait for a send acknowledgement (default: 30)
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            wait_for_topic_directory_secs: default_wait_for_topic_directory_secs(),
            max_message_age_hours: default_max_message_age_hours(),
            max_resend_retries: default_max_resend_retries(),
            topic_directory_poll_interval_ms: default_topic_directory_poll_interval_ms(),
            topic_availability_poll_interval_ms: default_topic_availability_poll_interval_ms(),
            topic_availability_max_polls: default_topic_availability_max_polls(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

impl ReplayOptions {
    pub fn topic_directory_wait(&self) -> Duration {
        Duration::from_secs(self.wait_for_topic_directory_secs)
    }

    pub fn topic_directory_poll_interval(&self) -> Duration {
        Duration::from_millis(self.topic_directory_poll_interval_ms)
    }

    pub fn topic_availability_poll_interval(&self) -> Duration {
        Duration::from_millis(self.topic_availability_poll_interval_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Validate replay options
    pub fn validate(&self) -> crate::Result<()> {
        if self.topic_directory_poll_interval_ms == 0 {
            return Err(crate::Error::Config(
                "topic_directory_poll_interval_ms must be > 0".to_string(),
            ));
        }

        if self.topic_availability_poll_interval_ms == 0 {
            return Err(crate::Error::Config(
                "topic_availability_poll_interval_ms must be > 0".to_string(),
            ));
        }

        if self.topic_availability_max_polls == 0 {
            return Err(crate::Error::Config(
                "topic_availability_max_polls must be > 0".to_string(),
            ));
        }

        if self.send_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "send_timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_wait_for_topic_directory_secs() -> u64 {
    120
}

fn default_max_message_age_hours() -> u32 {
    72
}

fn default_max_resend_retries() -> u32 {
    5
}

fn default_topic_directory_poll_interval_ms() -> u64 {
    100
}

fn default_topic_availability_poll_interval_ms() -> u64 {
    500
}

fn default_topic_availability_max_polls() -> u32 {
    20
}

fn default_send_timeout_secs() -> u64 {
    30
}

/// Pending message store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum MessageStoreConfig {
    /// Durable SQLite database file
    Sqlite {
        #[serde(default = "default_message_db_path")]
        db_path: PathBuf,
    },
    /// Non-durable, for tests and ephemeral deployments
    Memory,
}

impl Default for MessageStoreConfig {
    fn default() -> Self {
        MessageStoreConfig::Sqlite {
            db_path: default_message_db_path(),
        }
    }
}

fn default_message_db_path() -> PathBuf {
    PathBuf::from("./pending-messages.db")
}

/// Offset change indicator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetIndicatorConfig {
    /// Storage holding the retransmission requests
    #[serde(default = "default_indicator_storage")]
    pub storage: StorageBackendConfig,

    /// Key prefix inside the storage (default: retransmission)
    #[serde(default = "default_indicator_prefix")]
    pub prefix: String,
}

impl Default for OffsetIndicatorConfig {
    fn default() -> Self {
        Self {
            storage: default_indicator_storage(),
            prefix: default_indicator_prefix(),
        }
    }
}

fn default_indicator_storage() -> StorageBackendConfig {
    StorageBackendConfig::Filesystem {
        path: PathBuf::from("./offset-indicator"),
    }
}

fn default_indicator_prefix() -> String {
    "retransmission".to_string()
}

impl Config {
    /// Parse a YAML configuration document
    pub fn from_yaml(content: &str) -> crate::Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.cluster_name.trim().is_empty() {
            return Err(crate::Error::Config(
                "cluster_name must not be empty".to_string(),
            ));
        }

        self.replay.validate()?;

        if self.offset_backends.is_empty() {
            return Err(crate::Error::Config(
                "at least one offset backend must be configured".to_string(),
            ));
        }

        if self.offset_indicator.prefix.trim_matches('/').is_empty() {
            return Err(crate::Error::Config(
                "offset_indicator.prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
