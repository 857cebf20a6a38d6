//! SQLite-based offset backend implementation.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use super::{OffsetBackend, OffsetInfo};
use crate::subscription::{SubscriptionName, SubscriptionPartitionOffset};
use crate::Result;

/// SQLite-based offset backend
pub struct SqliteOffsetBackend {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteOffsetBackend {
    /// Create a new SQLite offset backend
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite:{}?mode=rwc",
            db_path.display()
        ))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let backend = Self { pool, db_path };
        backend.initialize_schema().await?;

        Ok(backend)
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscription_offsets (
                subscription TEXT NOT NULL,
                topic TEXT NOT NULL,
                partition INTEGER NOT NULL,
                offset_value INTEGER NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),
                PRIMARY KEY (subscription, topic, partition)
            );

            CREATE INDEX IF NOT EXISTS idx_offsets_subscription ON subscription_offsets(subscription);
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite offset schema initialized");
        Ok(())
    }
}

#[async_trait]
impl OffsetBackend for SqliteOffsetBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn move_subscription_offset(&self, offset: &SubscriptionPartitionOffset) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscription_offsets (subscription, topic, partition, offset_value, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(subscription, topic, partition)
            DO UPDATE SET offset_value = excluded.offset_value, updated_at = excluded.updated_at
            "#,
        )
        .bind(offset.subscription_name().to_string())
        .bind(offset.topic())
        .bind(offset.partition())
        .bind(offset.offset())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!(
            "Moved {} {}:{} to offset {} in {}",
            offset.subscription_name(),
            offset.topic(),
            offset.partition(),
            offset.offset(),
            self.db_path.display()
        );
        Ok(())
    }

    async fn get_offset(
        &self,
        subscription: &SubscriptionName,
        topic: &str,
        partition: i32,
    ) -> Result<Option<i64>> {
        let result: Option<(i64,)> = sqlx::query_as(
            "SELECT offset_value FROM subscription_offsets WHERE subscription = ? AND topic = ? AND partition = ?",
        )
        .bind(subscription.to_string())
        .bind(topic)
        .bind(partition)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.map(|(offset,)| offset))
    }

    async fn get_subscription_offsets(
        &self,
        subscription: &SubscriptionName,
    ) -> Result<Vec<OffsetInfo>> {
        let rows: Vec<(String, i32, i64, i64)> = sqlx::query_as(
            r#"
            SELECT topic, partition, offset_value, updated_at
            FROM subscription_offsets
            WHERE subscription = ?
            ORDER BY topic, partition
            "#,
        )
        .bind(subscription.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(topic, partition, offset, updated_at)| OffsetInfo {
                topic,
                partition,
                offset,
                updated_at,
            })
            .collect())
    }
}
