use anyhow::Result;
use chunklog_core::LogService;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::commands::{parse_log_id, print_json};

/// Print `count` lines starting at `first_line`, prefixed by their numbers
pub async fn execute(
    service: &LogService,
    log_id: &str,
    first_line: u64,
    count: u64,
    format: OutputFormat,
) -> Result<()> {
    let id = parse_log_id(log_id)?;
    let lines = service.read_lines(id, first_line, count).await?;
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = lines
                .iter()
                .zip(first_line..)
                .map(|(text, line)| json!({ "line": line, "text": text }))
                .collect();
            print_json(&rows)?;
        }
        OutputFormat::Text => {
            for (text, line) in lines.iter().zip(first_line..) {
                println!("{:>6}: {}", line, text);
            }
        }
    }
    Ok(())
}
