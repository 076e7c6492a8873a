use anyhow::Result;
use chunklog_core::LogService;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::commands::{parse_log_id, print_json};

/// Seal a log, counting any unterminated trailing line
pub async fn execute(service: &LogService, log_id: &str, format: OutputFormat) -> Result<()> {
    let id = parse_log_id(log_id)?;
    let log = service.writer(id).await?.complete().await?;
    match format {
        OutputFormat::Json => print_json(&log)?,
        OutputFormat::Text => println!(
            "{} {} is complete with {} lines",
            "Success:".green().bold(),
            log.id,
            log.line_count
        ),
    }
    Ok(())
}
