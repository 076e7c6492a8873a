use anyhow::{Context, Result};
use chunklog_config::{ChunklogConfig, ConfigLoader};
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::ConfigCommands;

/// Execute config subcommand
///
/// `loaded` is the effective configuration, or the error loading it
/// produced; only `show` needs it to be valid.
pub async fn execute(cmd: ConfigCommands, loaded: Result<ChunklogConfig>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(loaded?),
        ConfigCommands::Path => path(),
        ConfigCommands::Init { path, force } => init(path, force).await,
    }
}

fn show(config: ChunklogConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

fn path() -> Result<()> {
    let path = ConfigLoader::default_global_path()
        .context("Could not determine config file path")?;
    println!("{}", path.display());
    Ok(())
}

/// Write the default configuration to a new file
async fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = path
        .or_else(ConfigLoader::default_global_path)
        .context("Could not determine config file path")?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = format!(
        "# chunklog configuration\n\n{}",
        ChunklogConfig::default().to_toml()?
    );
    tokio::fs::write(&config_path, contents)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!(
        "{} Created config file at: {}",
        "Success:".green().bold(),
        config_path.display()
    );
    println!(
        "{}",
        "Unset values keep their built-in defaults.".dimmed()
    );
    Ok(())
}
