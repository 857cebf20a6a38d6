use anyhow::{bail, Context, Result};
use ingest_recovery_core::storage::create_backend;
use ingest_recovery_core::{
    create_offset_backends, Config, OffsetChangeIndicator, OffsetRetransmitter, PartitionOffset,
    RecoveryMetrics, RetransmissionReport, StorageOffsetChangeIndicator, SubscriptionName,
};
use std::sync::Arc;

use super::{load_config, OutputFormat};

fn indicator(config: &Config) -> StorageOffsetChangeIndicator {
    StorageOffsetChangeIndicator::with_prefix(
        create_backend(&config.offset_indicator.storage),
        config.offset_indicator.prefix.clone(),
    )
}

fn parse_subscription(subscription: &str) -> Result<SubscriptionName> {
    SubscriptionName::from_string(subscription)
        .with_context(|| format!("Invalid subscription '{}'", subscription))
}

/// Parse `partition=offset`
fn parse_partition_offset(value: &str) -> Result<(i32, i64)> {
    let Some((partition, offset)) = value.split_once('=') else {
        bail!("Expected partition=offset, got '{}'", value);
    };

    let partition: i32 = partition
        .trim()
        .parse()
        .with_context(|| format!("Invalid partition in '{}'", value))?;
    let offset: i64 = offset
        .trim()
        .parse()
        .with_context(|| format!("Invalid offset in '{}'", value))?;

    if partition < 0 || offset < 0 {
        bail!("Partition and offset must be non-negative, got '{}'", value);
    }

    Ok((partition, offset))
}

/// Record target offsets for a subscription in the offset change indicator
pub async fn request(
    config_path: &str,
    subscription: &str,
    partition_offsets: &[String],
) -> Result<()> {
    let config = load_config(config_path).await?;
    let subscription = parse_subscription(subscription)?;

    if partition_offsets.is_empty() {
        bail!("At least one --partition-offset is required");
    }

    let parsed = partition_offsets
        .iter()
        .map(|v| parse_partition_offset(v))
        .collect::<Result<Vec<_>>>()?;

    let indicator = indicator(&config);
    let topic = subscription.topic_name().qualified_name();
    for (partition, offset) in parsed {
        indicator
            .set_subscription_offset(
                subscription.topic_name(),
                subscription.name(),
                &config.cluster_name,
                &PartitionOffset::new(topic.clone(), partition, offset),
            )
            .await?;
    }

    println!(
        "Recorded {} partition offsets for {} in cluster {}",
        partition_offsets.len(),
        subscription,
        config.cluster_name
    );
    println!();
    println!("To apply them, run:");
    println!(
        "  ingest-recovery offsets retransmit --config {} --subscription '{}'",
        config_path, subscription
    );
    Ok(())
}

async fn run_retransmission(
    config: &Config,
    subscription: &SubscriptionName,
    metrics: Arc<RecoveryMetrics>,
) -> Result<RetransmissionReport> {
    let backends = create_offset_backends(&config.offset_backends).await?;
    let retransmitter = OffsetRetransmitter::new(
        Arc::new(indicator(config)),
        backends,
        config.cluster_name.clone(),
    )
    .with_metrics(metrics);

    Ok(retransmitter.reload_offsets(subscription).await?)
}

/// Apply recorded offsets to every configured offset backend
pub async fn retransmit(
    config_path: &str,
    subscription: &str,
    format: OutputFormat,
    print_metrics: bool,
) -> Result<()> {
    let config = load_config(config_path).await?;
    let subscription = parse_subscription(subscription)?;

    let metrics = Arc::new(RecoveryMetrics::new());
    let result = run_retransmission(&config, &subscription, metrics.clone()).await;

    // Failed runs are counted too, so print before bailing out
    if print_metrics {
        eprint!("{}", metrics.encode());
    }
    let report = result?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("Retransmission completed for {}", report.subscription);
            println!("  Partitions:     {}", report.partitions);
            println!("  Backend writes: {}", report.writes);
        }
    }

    Ok(())
}

/// Print the offsets each configured backend holds for a subscription
pub async fn show(config_path: &str, subscription: &str, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path).await?;
    let subscription = parse_subscription(subscription)?;

    let backends = create_offset_backends(&config.offset_backends).await?;

    let mut per_backend = Vec::with_capacity(backends.len());
    for backend in &backends {
        let offsets = backend.get_subscription_offsets(&subscription).await?;
        per_backend.push((backend.name().to_string(), offsets));
    }

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = per_backend
                .iter()
                .map(|(name, offsets)| serde_json::json!({ "backend": name, "offsets": offsets }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            println!("Offsets for {}:", subscription);
            for (index, (name, offsets)) in per_backend.iter().enumerate() {
                println!("  [{}] {}", index, name);
                if offsets.is_empty() {
                    println!("      (none)");
                }
                for o in offsets {
                    println!("      {}:{} -> {}", o.topic, o.partition, o.offset);
                }
            }
        }
    }

    Ok(())
}
