//! SQLite-based pending message store.

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::{MessageStore, StoredMessage};
use crate::message::{PendingMessage, TopicName};
use crate::Result;

/// SQLite-based message store
///
/// Every save is committed before returning, with `synchronous = FULL`, so a
/// message survives a crash as soon as `save` succeeds.
pub struct SqliteMessageStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteMessageStore {
    /// Open (or create) a message store at `db_path`
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite:{}?mode=rwc",
            db_path.display()
        ))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool, db_path };
        store.initialize_schema().await?;

        info!("Opened pending message store at {}", store.db_path.display());
        Ok(store)
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Close the underlying connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pending_messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id TEXT NOT NULL UNIQUE,
                topic TEXT NOT NULL,
                payload BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                saved_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
            );

            CREATE INDEX IF NOT EXISTS idx_pending_topic ON pending_messages(topic);
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite message schema initialized");
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn save(&self, message: &PendingMessage, topic: &TopicName) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pending_messages (message_id, topic, payload, created_at, saved_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(message_id)
            DO UPDATE SET topic = excluded.topic,
                          payload = excluded.payload,
                          created_at = excluded.created_at,
                          saved_at = excluded.saved_at
            "#,
        )
        .bind(message.id())
        .bind(topic.qualified_name())
        .bind(message.payload().as_ref())
        .bind(message.created_at())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!("Saved message {} for topic {}", message.id(), topic);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredMessage>> {
        let rows: Vec<(String, String, Vec<u8>, i64)> = sqlx::query_as(
            "SELECT message_id, topic, payload, created_at FROM pending_messages ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, topic, payload, created_at)| StoredMessage {
                message: PendingMessage::new(id, Bytes::from(payload), created_at),
                topic,
            })
            .collect())
    }

    async fn delete(&self, message_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pending_messages WHERE message_id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_messages")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0.max(0) as u64)
    }
}
