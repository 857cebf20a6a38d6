use anyhow::Result;
use ingest_recovery_core::{create_message_store, StoredMessage};
use serde_json::json;
use tracing::info;

use super::{load_config, OutputFormat};

const MILLIS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

fn is_stale(stored: &StoredMessage, max_age_hours: u32, now_ms: i64) -> bool {
    stored.message.is_stale(max_age_hours, now_ms)
}

/// List messages waiting in the pending message store
pub async fn list(config_path: &str, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path).await?;
    let store = create_message_store(&config.message_store).await?;

    let messages = store.load_all().await?;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let max_age = config.replay.max_message_age_hours;

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = messages
                .iter()
                .map(|m| {
                    json!({
                        "id": m.message.id(),
                        "topic": m.topic,
                        "created_at": m.message.created_at(),
                        "size_bytes": m.message.payload().len(),
                        "stale": is_stale(m, max_age, now_ms),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if messages.is_empty() {
                println!("No pending messages");
                return Ok(());
            }

            println!("Pending messages (max age {}h):", max_age);
            for m in &messages {
                let created = chrono::DateTime::from_timestamp_millis(m.message.created_at())
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| "Unknown".to_string());
                println!(
                    "  - {} [{}] created {} ({:.1}h old, {} bytes){}",
                    m.message.id(),
                    m.topic,
                    created,
                    m.message.age_ms(now_ms) as f64 / MILLIS_PER_HOUR,
                    m.message.payload().len(),
                    if is_stale(m, max_age, now_ms) {
                        " STALE"
                    } else {
                        ""
                    }
                );
            }
            println!("Total: {}", messages.len());
        }
    }

    Ok(())
}

/// Delete messages that replay would drop as too old
pub async fn purge_stale(config_path: &str, dry_run: bool) -> Result<()> {
    let config = load_config(config_path).await?;
    let store = create_message_store(&config.message_store).await?;

    let now_ms = chrono::Utc::now().timestamp_millis();
    let max_age = config.replay.max_message_age_hours;

    let stale: Vec<StoredMessage> = store
        .load_all()
        .await?
        .into_iter()
        .filter(|m| is_stale(m, max_age, now_ms))
        .collect();

    if dry_run {
        println!("Would delete {} stale messages:", stale.len());
        for m in &stale {
            println!("  - {} [{}]", m.message.id(), m.topic);
        }
        return Ok(());
    }

    let mut deleted = 0;
    for m in &stale {
        if store.delete(m.message.id()).await? {
            deleted += 1;
        }
    }

    info!("Deleted {} messages older than {}h", deleted, max_age);
    println!("Deleted {} stale messages", deleted);
    Ok(())
}
