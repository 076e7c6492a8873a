//! Command line front end for chunklog stores
//!
//! The binary lives in `main.rs`; argument parsing, config resolution and the
//! subcommand implementations are exposed here so they can be tested.

pub mod cli;
pub mod commands;
pub mod config;
