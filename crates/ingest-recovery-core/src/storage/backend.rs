//! Storage backend trait definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Key/value object storage used for small JSON documents
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to a key
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Read data from a key
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// List keys with a given prefix, sorted
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
