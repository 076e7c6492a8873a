//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config at {path}: {source}")]
    Read {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::ChunklogConfig`]
    #[error("Failed to parse config at {path}: {message}")]
    Parse {
        /// Path that was being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A field holds a value outside its permitted range
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Dotted field name, e.g. `index.block_size`
        field: String,
        /// Explanation of the rejected value
        value: String,
    },

    /// The configuration could not be rendered back to TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}
