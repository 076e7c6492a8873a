use anyhow::Result;
use chunklog_core::LogService;
use tokio::io::AsyncWriteExt;

use crate::commands::parse_log_id;

/// Copy the raw log bytes to stdout
pub async fn execute(service: &LogService, log_id: &str) -> Result<()> {
    let id = parse_log_id(log_id)?;
    let data = service.read_raw(id).await?;
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&data).await?;
    stdout.flush().await?;
    Ok(())
}
