use anyhow::Result;
use chunklog_core::{LogService, LogType};

use crate::cli::OutputFormat;
use crate::commands::print_json;

/// Create an empty log and print its id
pub async fn execute(service: &LogService, log_type: LogType, format: OutputFormat) -> Result<()> {
    let log = service.create_log(log_type).await?;
    match format {
        OutputFormat::Json => print_json(&log)?,
        OutputFormat::Text => println!("{}", log.id),
    }
    Ok(())
}
