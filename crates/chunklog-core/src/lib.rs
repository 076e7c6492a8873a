//! # Chunklog Core
//!
//! Append-only log storage with an embedded substring index.
//!
//! Logs are cut into blocks that are stored as immutable, content-addressed
//! blobs. Each block carries a trie of the 8-byte shingles that start in
//! it, so a search only reads the blocks that can possibly match.
//!
//! ```rust
//! use chunklog_config::IndexConfig;
//! use chunklog_core::{LogService, LogType, SearchStats};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), chunklog_core::LogError> {
//! let service = LogService::in_memory(IndexConfig::default());
//! let log = service.create_log(LogType::Text).await?;
//!
//! let mut writer = service.writer(log.id).await?;
//! writer.write_data(b"compiling\nerror: missing semicolon\n")?;
//! writer.complete().await?;
//!
//! let mut stats = SearchStats::default();
//! let lines = service
//!     .search(log.id, "ERROR", 0, 10, &mut stats, &CancellationToken::new())
//!     .await?;
//! assert_eq!(lines, vec![1]);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod index;
pub mod log;
pub mod service;
pub mod storage;
pub mod trie;

pub use error::{EntityKind, LogError, LogResult};
pub use log::{Log, LogId, LogInfo, LogSnapshot, LogType, LogWriter, SearchStats};
pub use service::LogService;
pub use storage::{BlobHash, BlobStore, BlobWriter, CasResult, FileBlobStore, MemoryBlobStore};
pub use trie::{ReadOnlyTrie, ReadOnlyTrieBuilder};
