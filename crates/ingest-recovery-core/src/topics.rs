//! Topic metadata lookup.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::message::Topic;

/// Eventually-consistent cache of topic metadata
#[async_trait]
pub trait TopicDirectory: Send + Sync {
    /// Look up a topic by its qualified name (`group.topic`)
    async fn get_topic(&self, qualified_name: &str) -> Option<Topic>;

    /// Whether the cache has been populated
    async fn is_ready(&self) -> bool;
}

/// Topic directory fed explicitly by the embedder
#[derive(Debug, Default)]
pub struct InMemoryTopicDirectory {
    topics: RwLock<HashMap<String, Topic>>,
    ready: AtomicBool,
}

impl InMemoryTopicDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory that is already marked ready
    pub fn with_topics(topics: impl IntoIterator<Item = Topic>) -> Self {
        let directory = Self::new();
        for topic in topics {
            directory.add_topic(topic);
        }
        directory.mark_ready();
        directory
    }

    pub fn add_topic(&self, topic: Topic) {
        self.topics.write().insert(topic.qualified_name(), topic);
    }

    pub fn remove_topic(&self, qualified_name: &str) -> Option<Topic> {
        self.topics.write().remove(qualified_name)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.topics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.read().is_empty()
    }
}

#[async_trait]
impl TopicDirectory for InMemoryTopicDirectory {
    async fn get_topic(&self, qualified_name: &str) -> Option<Topic> {
        self.topics.read().get(qualified_name).cloned()
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
