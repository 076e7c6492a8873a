//! Tiered configuration loading
//!
//! Resolution order, later tiers replacing earlier ones section by section:
//! 1. Built-in defaults
//! 2. Global config (`~/.config/chunklog/config.toml`)
//! 3. An explicitly supplied file (e.g. `--config`)

use crate::{ChunklogConfig, ConfigError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`ChunklogConfig`] from the configuration tiers
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    global_path: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader using the platform's global config location
    pub fn new() -> Self {
        Self {
            global_path: Self::default_global_path(),
            explicit_path: None,
        }
    }

    /// The global config path for this platform, if one exists
    pub fn default_global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chunklog").join("config.toml"))
    }

    /// Builder-style: replace (or disable) the global tier
    #[must_use]
    pub fn with_global_path(mut self, path: Option<PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    /// Builder-style: add an explicit file as the last tier
    ///
    /// Unlike the global tier, an explicit file that does not exist is an error.
    #[must_use]
    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    /// Resolve all tiers and validate the result
    pub fn load(&self) -> Result<ChunklogConfig, ConfigError> {
        let mut config = ChunklogConfig::default();

        if let Some(global) = &self.global_path {
            if global.exists() {
                debug!(path = %global.display(), "loading global config");
                config = merge(config, read_table(global)?, global)?;
            }
        }

        if let Some(explicit) = &self.explicit_path {
            debug!(path = %explicit.display(), "loading explicit config");
            config = merge(config, read_table(explicit)?, explicit)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a single file on top of the built-in defaults
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<ChunklogConfig, ConfigError> {
        Self::new()
            .with_global_path(None)
            .with_explicit_path(Some(path.as_ref().to_path_buf()))
            .load()
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Overlay the keys present in `overlay` onto `base`.
fn merge(
    base: ChunklogConfig,
    overlay: toml::Table,
    path: &Path,
) -> Result<ChunklogConfig, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut merged = toml::Table::try_from(&base).map_err(|e| parse_err(e.to_string()))?;
    for (section, value) in overlay {
        match (merged.get_mut(&section), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                existing.extend(incoming);
            }
            (_, value) => {
                merged.insert(section, value);
            }
        }
    }

    merged.try_into().map_err(|e: toml::de::Error| parse_err(e.to_string()))
}
