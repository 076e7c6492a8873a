use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output format for commands that print structured data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text and tables
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Log format accepted by `new` and `ingest`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogKind {
    /// Plain text lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl From<LogKind> for chunklog_core::LogType {
    fn from(kind: LogKind) -> Self {
        match kind {
            LogKind::Text => chunklog_core::LogType::Text,
            LogKind::Json => chunklog_core::LogType::Json,
        }
    }
}

#[derive(Parser)]
#[command(name = "chunklog")]
#[command(about = "chunklog - append-only build logs with indexed substring search")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/chunklog/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root directory (overrides config file)
    #[arg(long, global = true, env = "CHUNKLOG_ROOT")]
    pub root: Option<PathBuf>,

    /// Block size in bytes for new writers (overrides config file)
    #[arg(long, global = true)]
    pub block_size: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty log and print its id
    New {
        /// Format of the log's lines
        #[arg(short = 't', long = "type", value_enum, default_value = "text")]
        log_type: LogKind,
    },

    /// Create a log from a file (or stdin) and print its id
    Ingest {
        /// File to read; `-` reads stdin
        path: PathBuf,

        /// Format of the log's lines
        #[arg(short = 't', long = "type", value_enum, default_value = "text")]
        log_type: LogKind,

        /// Leave the log open for further appends
        #[arg(long)]
        keep_open: bool,
    },

    /// Append text to an open log
    Append {
        /// Log id
        log_id: String,

        /// Text to append; a newline is added unless --raw is given
        #[arg(conflicts_with = "file")]
        text: Option<String>,

        /// Append the contents of a file instead
        #[arg(long)]
        file: Option<PathBuf>,

        /// Do not add a trailing newline to TEXT
        #[arg(long)]
        raw: bool,
    },

    /// Mark a log complete
    Complete {
        /// Log id
        log_id: String,
    },

    /// Search a log for lines containing text (ASCII case-insensitive)
    Search {
        /// Log id
        log_id: String,

        /// Text to look for
        query: String,

        /// First line to consider
        #[arg(long, default_value_t = 0)]
        first_line: u64,

        /// Maximum number of matching lines (defaults to config value)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Print the text of each matching line
        #[arg(long)]
        show_lines: bool,

        /// Print skip/scan statistics
        #[arg(long)]
        stats: bool,
    },

    /// Write the raw log bytes to stdout
    Cat {
        /// Log id
        log_id: String,
    },

    /// Print a range of lines
    Lines {
        /// Log id
        log_id: String,

        /// First line (zero-based)
        first_line: u64,

        /// Number of lines
        #[arg(default_value_t = 10)]
        count: u64,
    },

    /// Show size and index shape of a log
    Info {
        /// Log id
        log_id: String,
    },

    /// List all logs
    List,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Print the global config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Where to write (defaults to the global config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
