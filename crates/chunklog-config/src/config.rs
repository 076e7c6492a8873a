//! Configuration sections
//!
//! Every section is `#[serde(default)]` so partial files only need to name
//! the values they override.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of bytes per indexed block
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Default number of block summaries per index page
pub const DEFAULT_PAGE_CAPACITY: usize = 64;

/// Default cap on search results when the caller does not supply one
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunklogConfig {
    /// Where blobs, refs and log records are kept
    pub storage: StorageConfig,
    /// Block and page sizing for the index
    pub index: IndexConfig,
    /// Search defaults
    pub search: SearchConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

impl ChunklogConfig {
    /// Check every section for out-of-range values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.index.validate()?;
        self.search.validate()
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Storage location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding `blobs/` (objects and refs) and `logs/`
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = dirs::data_dir()
            .map(|dir| dir.join("chunklog"))
            .unwrap_or_else(|| PathBuf::from("./.chunklog"));
        Self { root }
    }
}

/// Index sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Byte length at which an open block is sealed
    pub block_size: usize,
    /// Maximum block summaries stored in one index page
    pub page_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            page_capacity: DEFAULT_PAGE_CAPACITY,
        }
    }
}

impl IndexConfig {
    /// Builder-style: set the block size
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Builder-style: set the page capacity
    #[must_use]
    pub fn with_page_capacity(mut self, page_capacity: usize) -> Self {
        self.page_capacity = page_capacity;
        self
    }

    /// Reject sizes the builder cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index.block_size".to_string(),
                value: "must be at least 1 byte".to_string(),
            });
        }
        if self.page_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index.page_capacity".to_string(),
                value: "must hold at least 1 block".to_string(),
            });
        }
        Ok(())
    }
}

/// Search defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result cap applied when a caller does not pass one
    pub default_max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_results == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.default_max_results".to_string(),
                value: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter when no CLI flag is given (`off`, `error`, `warn`, ...)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ChunklogConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.index.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.index.page_capacity, DEFAULT_PAGE_CAPACITY);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let index = IndexConfig::default().with_block_size(0);
        let err = index.validate().unwrap_err();
        assert!(err.to_string().contains("index.block_size"));
    }

    #[test]
    fn test_zero_page_capacity_rejected() {
        let index = IndexConfig::default().with_page_capacity(0);
        assert!(index.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ChunklogConfig = toml::from_str("[index]\nblock_size = 16\n").unwrap();
        assert_eq!(config.index.block_size, 16);
        assert_eq!(config.index.page_capacity, DEFAULT_PAGE_CAPACITY);
        assert_eq!(config.search.default_max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ChunklogConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: ChunklogConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
