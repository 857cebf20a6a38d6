//! Pending message and topic value objects.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// A message that could not be confirmed by the broker and was persisted locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    id: String,
    payload: Bytes,
    created_at: i64,
}

impl PendingMessage {
    pub fn new(id: impl Into<String>, payload: impl Into<Bytes>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Creation time (epoch milliseconds)
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Age of the message at `now_ms`, in milliseconds.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.created_at
    }

    /// Whether the message is older than `max_age_hours` at `now_ms`.
    ///
    /// The comparison is strict: a message exactly at the boundary is still fresh.
    pub fn is_stale(&self, max_age_hours: u32, now_ms: i64) -> bool {
        self.age_ms(now_ms) > i64::from(max_age_hours) * MILLIS_PER_HOUR
    }
}

/// Qualified topic name: `group.topic`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicName {
    group: String,
    name: String,
}

impl TopicName {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Parse a qualified name, splitting group and topic on the last `.`.
    pub fn from_qualified_name(qualified: &str) -> Result<Self> {
        match qualified.rsplit_once('.') {
            Some((group, name)) if !group.is_empty() && !name.is_empty() => {
                Ok(Self::new(group, name))
            }
            _ => Err(Error::InvalidName(format!(
                "'{}' is not a qualified topic name (expected group.topic)",
                qualified
            ))),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

impl FromStr for TopicName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_qualified_name(s)
    }
}

impl TryFrom<String> for TopicName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_qualified_name(&value)
    }
}

impl From<TopicName> for String {
    fn from(value: TopicName) -> Self {
        value.qualified_name()
    }
}

/// Content type carried by a topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Json,
    Avro,
}

/// Broker acknowledgement level expected for a topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ack {
    #[default]
    Leader,
    All,
}

/// Topic metadata as cached by the topic directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: TopicName,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub ack: Ack,
}

impl Topic {
    pub fn new(name: TopicName) -> Self {
        Self {
            name,
            content_type: ContentType::default(),
            ack: Ack::default(),
        }
    }

    pub fn qualified_name(&self) -> String {
        self.name.qualified_name()
    }
}
