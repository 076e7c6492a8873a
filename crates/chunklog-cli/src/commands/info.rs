use anyhow::Result;
use chunklog_core::LogService;
use comfy_table::{Cell, Color, Table};
use serde_json::json;

use crate::cli::OutputFormat;
use crate::commands::{parse_log_id, print_json};

/// Show a log's record alongside the shape of its persisted index
pub async fn execute(service: &LogService, log_id: &str, format: OutputFormat) -> Result<()> {
    let id = parse_log_id(log_id)?;
    let log = service
        .get_log(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Log {} not found", id))?;
    let info = service.info(id).await?;

    match format {
        OutputFormat::Json => print_json(&json!({ "log": log, "index": info }))?,
        OutputFormat::Text => {
            let status = if info.complete {
                Cell::new("complete").fg(Color::Green)
            } else {
                Cell::new("open").fg(Color::Yellow)
            };
            let root = info
                .root
                .map(|hash| hash.to_string())
                .unwrap_or_else(|| "-".to_string());

            let mut table = Table::new();
            table.set_header(vec!["Field", "Value"]);
            table.add_row(vec![Cell::new("id"), Cell::new(log.id)]);
            table.add_row(vec![Cell::new("type"), Cell::new(log.log_type)]);
            table.add_row(vec![Cell::new("status"), status]);
            table.add_row(vec![Cell::new("lines"), Cell::new(info.line_count)]);
            table.add_row(vec![Cell::new("bytes"), Cell::new(info.length)]);
            table.add_row(vec![Cell::new("pages"), Cell::new(info.pages)]);
            table.add_row(vec![Cell::new("blocks"), Cell::new(info.blocks)]);
            table.add_row(vec![Cell::new("root"), Cell::new(root)]);
            table.add_row(vec![Cell::new("updated"), Cell::new(log.updated_at.to_rfc3339())]);
            println!("{table}");
        }
    }
    Ok(())
}
