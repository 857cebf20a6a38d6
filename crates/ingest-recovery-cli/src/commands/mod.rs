pub mod offsets;
pub mod pending;

use anyhow::{Context, Result};
use ingest_recovery_core::Config;
use tracing::info;

/// Output format for command reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Read and validate a YAML configuration file
pub async fn load_config(config_path: &str) -> Result<Config> {
    info!("Loading configuration from: {}", config_path);

    let config_content = tokio::fs::read_to_string(config_path)
        .await
        .with_context(|| format!("Failed to read {}", config_path))?;
    let config = Config::from_yaml(&config_content)?;

    Ok(config)
}
