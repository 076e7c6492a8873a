use anyhow::{bail, Context, Result};
use chunklog_core::LogService;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::{ingest::copy_into, parse_log_id};

/// Append a line of text, or a file's contents, to an open log
pub async fn execute(
    service: &LogService,
    log_id: &str,
    text: Option<String>,
    file: Option<PathBuf>,
    raw: bool,
) -> Result<()> {
    let id = parse_log_id(log_id)?;
    let mut writer = service.writer(id).await?;

    match (text, file) {
        (Some(mut text), None) => {
            if !raw {
                text.push('\n');
            }
            writer.write_data(text.as_bytes())?;
        }
        (None, Some(path)) => {
            let mut source = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            copy_into(&mut source, &mut writer).await?;
        }
        _ => bail!("Provide either TEXT or --file"),
    }

    let log = writer.flush(false).await?;
    eprintln!(
        "{} {} now has {} complete lines",
        "Appended:".green().bold(),
        log.id,
        log.line_count
    );
    Ok(())
}
