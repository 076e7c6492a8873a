//! Chunked, indexed logs
//!
//! ## Key Components
//!
//! - [`LogBuilder`]: cuts appended bytes into indexed blocks and writes the tree
//! - [`LogWriter`]: flush protocol (blobs, then ref, then metadata)
//! - [`LogSnapshot`]: consistent read view with raw reads, line reads and search
//! - [`LogStore`]: metadata records with optimistic concurrency

mod builder;
mod file_store;
mod node;
mod reader;
mod search;
mod store;
mod types;
mod writer;

pub use builder::{FlushedRoot, LogBuilder};
pub use file_store::FileLogStore;
pub use node::{BlockSummary, IndexNode, LogIndexPage, LogNode, PageRef, FORMAT_VERSION};
pub use reader::{LogInfo, LogSnapshot};
pub use search::SearchStats;
pub use store::{LogStore, MemoryLogStore};
pub use types::{Log, LogId, LogType};
pub use writer::LogWriter;
