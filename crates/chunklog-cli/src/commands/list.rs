use anyhow::Result;
use chunklog_core::LogService;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};

use crate::cli::OutputFormat;
use crate::commands::print_json;

/// List every log, oldest first
pub async fn execute(service: &LogService, format: OutputFormat) -> Result<()> {
    let logs = service.list_logs().await?;

    match format {
        OutputFormat::Json => print_json(&logs)?,
        OutputFormat::Text if logs.is_empty() => {
            println!("{}", "No logs yet.".dimmed());
        }
        OutputFormat::Text => {
            let mut table = Table::new();
            table.set_header(vec!["Id", "Type", "Lines", "Status", "Created"]);
            for log in &logs {
                let status = if log.complete {
                    Cell::new("complete").fg(Color::Green)
                } else {
                    Cell::new("open").fg(Color::Yellow)
                };
                table.add_row(vec![
                    Cell::new(log.id),
                    Cell::new(log.log_type),
                    Cell::new(log.line_count),
                    status,
                    Cell::new(log.created_at.format("%Y-%m-%d %H:%M:%S")),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
