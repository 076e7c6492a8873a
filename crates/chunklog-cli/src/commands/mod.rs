//! Subcommand implementations
//!
//! Each module exposes an `execute` function taking the service and the
//! already-parsed arguments.

pub mod append;
pub mod cat;
pub mod complete;
pub mod config;
pub mod info;
pub mod ingest;
pub mod lines;
pub mod list;
pub mod new;
pub mod search;

use anyhow::{Context, Result};
use chunklog_config::ChunklogConfig;
use chunklog_core::{LogId, LogService};

/// Service rooted at the configured storage directory
pub fn open_service(config: &ChunklogConfig) -> LogService {
    LogService::from_config(config)
}

pub(crate) fn parse_log_id(raw: &str) -> Result<LogId> {
    raw.parse()
        .with_context(|| format!("'{}' is not a log id", raw))
}

/// Render `value` as pretty JSON on stdout
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
