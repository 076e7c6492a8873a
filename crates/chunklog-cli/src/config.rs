//! Effective configuration for a CLI invocation

use anyhow::{Context, Result};
use chunklog_config::{ChunklogConfig, ConfigLoader};
use tracing_subscriber::filter::LevelFilter;

use crate::cli::Cli;

/// Load config tiers, then apply command-line overrides
pub fn load(cli: &Cli) -> Result<ChunklogConfig> {
    let mut config = ConfigLoader::new()
        .with_explicit_path(cli.config.clone())
        .load()
        .context("Failed to load configuration")?;

    if let Some(root) = &cli.root {
        config.storage.root = root.clone();
    }
    if let Some(block_size) = cli.block_size {
        config.index.block_size = block_size;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Level filter from flags, falling back to the config file
pub fn log_filter(cli: &Cli, config: Option<&ChunklogConfig>) -> LevelFilter {
    if let Some(level) = cli.log_level {
        return level.into();
    }
    if cli.verbose {
        return LevelFilter::DEBUG;
    }
    config
        .and_then(|config| config.logging.level.parse().ok())
        .unwrap_or(LevelFilter::WARN)
}
