//! # Chunklog Configuration Library
//!
//! Type-safe configuration for the chunklog storage engine and its CLI.
//!
//! ## Features
//!
//! - TOML configuration files with per-section defaults
//! - Tiered loading: built-in defaults, the global config file, then an
//!   explicitly supplied file
//! - Validation of index parameters before they reach the builder
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chunklog_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load()?;
//! println!("blocks are {} bytes", config.index.block_size);
//! # Ok::<(), chunklog_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod loader;

pub use config::*;
pub use error::*;
pub use loader::*;
