use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use chunklog_config::ChunklogConfig;

use chunklog_cli::{
    cli::{Cli, Commands, OutputFormat},
    commands, config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging needs the config file's level, so load before bailing on errors
    let loaded = config::load(&cli);
    let filter = EnvFilter::builder()
        .with_default_directive(config::log_filter(&cli, loaded.as_ref().ok()).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;
    match cli.command {
        Commands::Config(cmd) => commands::config::execute(cmd, loaded).await,
        command => run(command, loaded?, format).await,
    }
}

async fn run(command: Commands, config: ChunklogConfig, format: OutputFormat) -> Result<()> {
    debug!(root = %config.storage.root.display(), "using storage root");
    let service = commands::open_service(&config);

    match command {
        Commands::New { log_type } => commands::new::execute(&service, log_type.into(), format).await,
        Commands::Ingest {
            path,
            log_type,
            keep_open,
        } => commands::ingest::execute(&service, &path, log_type.into(), keep_open, format).await,
        Commands::Append {
            log_id,
            text,
            file,
            raw,
        } => commands::append::execute(&service, &log_id, text, file, raw).await,
        Commands::Complete { log_id } => commands::complete::execute(&service, &log_id, format).await,
        Commands::Search {
            log_id,
            query,
            first_line,
            max_results,
            show_lines,
            stats,
        } => {
            let options = commands::search::SearchOptions {
                first_line,
                max_results: max_results.unwrap_or(config.search.default_max_results),
                show_lines,
                show_stats: stats,
                format,
            };
            commands::search::execute(&service, &log_id, &query, options).await
        }
        Commands::Cat { log_id } => commands::cat::execute(&service, &log_id).await,
        Commands::Lines {
            log_id,
            first_line,
            count,
        } => commands::lines::execute(&service, &log_id, first_line, count, format).await,
        Commands::Info { log_id } => commands::info::execute(&service, &log_id, format).await,
        Commands::List => commands::list::execute(&service, format).await,
        Commands::Config(cmd) => commands::config::execute(cmd, Ok(config)).await,
    }
}
