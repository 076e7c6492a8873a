use anyhow::{Context, Result};
use chunklog_core::{LogService, LogType, LogWriter};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::cli::OutputFormat;
use crate::commands::print_json;

const READ_CHUNK: usize = 64 * 1024;

/// Create a log from `path` (`-` for stdin) and print its id
pub async fn execute(
    service: &LogService,
    path: &Path,
    log_type: LogType,
    keep_open: bool,
    format: OutputFormat,
) -> Result<()> {
    let log = service.create_log(log_type).await?;
    let mut writer = service.writer(log.id).await?;

    let bytes = if path == Path::new("-") {
        copy_into(&mut tokio::io::stdin(), &mut writer).await?
    } else {
        let mut file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        copy_into(&mut file, &mut writer).await?
    };

    let log = if keep_open {
        writer.flush(false).await?
    } else {
        writer.complete().await?
    };
    info!(log = %log.id, bytes, lines = log.line_count, "ingested log");

    match format {
        OutputFormat::Json => print_json(&log)?,
        OutputFormat::Text => println!("{}", log.id),
    }
    Ok(())
}

/// Stream `source` into `writer`, committing after every read
pub(crate) async fn copy_into<R>(source: &mut R, writer: &mut LogWriter) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    let mut total = 0u64;
    loop {
        let read = source.read(&mut buf).await.context("Failed to read input")?;
        if read == 0 {
            break;
        }
        writer.write_data(&buf[..read])?;
        let log = writer.flush(false).await?;
        total += read as u64;
        debug!(bytes = total, lines = log.line_count, "committed chunk");
    }
    Ok(total)
}
