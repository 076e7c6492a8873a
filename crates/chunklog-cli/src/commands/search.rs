use anyhow::Result;
use chunklog_core::{LogService, SearchStats};
use colored::Colorize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::commands::{parse_log_id, print_json};

/// Arguments of the `search` subcommand after defaults are applied
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub first_line: u64,
    pub max_results: usize,
    pub show_lines: bool,
    pub show_stats: bool,
    pub format: OutputFormat,
}

/// Search one log, printing matching line numbers (and optionally their text)
///
/// Ctrl-C cancels the search between blocks.
pub async fn execute(
    service: &LogService,
    log_id: &str,
    query: &str,
    options: SearchOptions,
) -> Result<()> {
    let id = parse_log_id(log_id)?;
    let snapshot = service.snapshot(id).await?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling search");
                cancel.cancel();
            }
        })
    };

    let mut stats = SearchStats::default();
    let result = snapshot
        .search(query, options.first_line, options.max_results, &mut stats, &cancel)
        .await;
    interrupt.abort();
    let lines = result?;
    debug!(matches = lines.len(), ?stats, "search finished");

    let mut texts = Vec::new();
    if options.show_lines {
        for &line in &lines {
            let text = snapshot.read_lines(line, 1).await?;
            texts.push(text.into_iter().next().unwrap_or_default());
        }
    }

    match options.format {
        OutputFormat::Json => {
            let matches: Vec<_> = if options.show_lines {
                lines
                    .iter()
                    .zip(&texts)
                    .map(|(line, text)| json!({ "line": line, "text": text }))
                    .collect()
            } else {
                lines.iter().map(|line| json!({ "line": line })).collect()
            };
            let mut output = json!({ "matches": matches });
            if options.show_stats {
                output["stats"] = serde_json::to_value(stats)?;
            }
            print_json(&output)?;
        }
        OutputFormat::Text => {
            if options.show_lines {
                for (line, text) in lines.iter().zip(&texts) {
                    println!("{}: {}", line.to_string().cyan(), text);
                }
            } else {
                for line in &lines {
                    println!("{}", line);
                }
            }
            if options.show_stats {
                eprintln!(
                    "{} {} scanned, {} skipped, {} false positive",
                    "Blocks:".bold(),
                    stats.num_scanned_blocks,
                    stats.num_skipped_blocks,
                    stats.num_false_positive_blocks
                );
            }
        }
    }
    Ok(())
}
