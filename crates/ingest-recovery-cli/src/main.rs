use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::OutputFormat;

#[derive(Parser)]
#[command(name = "ingest-recovery")]
#[command(about = "Inspect backed up messages and retransmit subscription offsets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the pending message store
    Pending {
        #[command(subcommand)]
        action: PendingAction,
    },

    /// Request, apply and inspect subscription offsets
    Offsets {
        #[command(subcommand)]
        action: OffsetsAction,
    },
}

#[derive(Subcommand)]
enum PendingAction {
    /// List messages waiting for replay
    List {
        /// Path to the configuration file
        #[arg(short, long)]
        config: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete messages older than the configured maximum age
    PurgeStale {
        /// Path to the configuration file
        #[arg(short, long)]
        config: String,

        /// Only print what would be deleted
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum OffsetsAction {
    /// Record target offsets for a subscription
    Request {
        /// Path to the configuration file
        #[arg(short, long)]
        config: String,

        /// Subscription as group.topic$subscription
        #[arg(short, long)]
        subscription: String,

        /// Target offsets as partition=offset (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        partition_offset: Vec<String>,
    },

    /// Apply recorded offsets to every offset backend
    Retransmit {
        /// Path to the configuration file
        #[arg(short, long)]
        config: String,

        /// Subscription as group.topic$subscription
        #[arg(short, long)]
        subscription: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Print Prometheus metrics for the run to stderr
        #[arg(long, default_value = "false")]
        metrics: bool,
    },

    /// Show the offsets each backend holds for a subscription
    Show {
        /// Path to the configuration file
        #[arg(short, long)]
        config: String,

        /// Subscription as group.topic$subscription
        #[arg(short, long)]
        subscription: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Pending { action } => match action {
            PendingAction::List { config, format } => {
                commands::pending::list(&config, OutputFormat::from(format.as_str())).await?;
            }
            PendingAction::PurgeStale { config, dry_run } => {
                commands::pending::purge_stale(&config, dry_run).await?;
            }
        },
        Commands::Offsets { action } => match action {
            OffsetsAction::Request {
                config,
                subscription,
                partition_offset,
            } => {
                commands::offsets::request(&config, &subscription, &partition_offset).await?;
            }
            OffsetsAction::Retransmit {
                config,
                subscription,
                format,
                metrics,
            } => {
                commands::offsets::retransmit(
                    &config,
                    &subscription,
                    OutputFormat::from(format.as_str()),
                    metrics,
                )
                .await?;
            }
            OffsetsAction::Show {
                config,
                subscription,
                format,
            } => {
                commands::offsets::show(&config, &subscription, OutputFormat::from(format.as_str()))
                    .await?;
            }
        },
    }

    Ok(())
}
