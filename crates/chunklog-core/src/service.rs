//! Facade tying blob storage, metadata and index configuration together

use chunklog_config::{ChunklogConfig, IndexConfig};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::error::{LogError, LogResult};
use crate::log::{
    FileLogStore, Log, LogBuilder, LogId, LogInfo, LogSnapshot, LogStore, LogType, LogWriter,
    MemoryLogStore, SearchStats,
};
use crate::storage::{BlobStore, FileBlobStore, MemoryBlobStore};

/// Entry point for creating, writing, reading and searching logs
#[derive(Clone)]
pub struct LogService {
    blobs: Arc<dyn BlobStore>,
    logs: Arc<dyn LogStore>,
    index: IndexConfig,
}

impl std::fmt::Debug for LogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogService")
            .field("blobs", &self.blobs)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl LogService {
    /// Assemble a service from its stores
    pub fn new(blobs: Arc<dyn BlobStore>, logs: Arc<dyn LogStore>, index: IndexConfig) -> Self {
        Self { blobs, logs, index }
    }

    /// Service backed entirely by memory
    pub fn in_memory(index: IndexConfig) -> Self {
        Self::new(
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryLogStore::new()),
            index,
        )
    }

    /// Service persisting under `root` (`root/blobs` and `root/logs`)
    pub fn open_dir(root: impl AsRef<Path>, index: IndexConfig) -> Self {
        let root = root.as_ref();
        debug!(root = %root.display(), "opening log directory");
        Self::new(
            Arc::new(FileBlobStore::new(root.join("blobs"))),
            Arc::new(FileLogStore::new(root)),
            index,
        )
    }

    /// Service for a loaded configuration
    pub fn from_config(config: &ChunklogConfig) -> Self {
        Self::open_dir(&config.storage.root, config.index.clone())
    }

    /// Blob store in use
    pub fn blob_store(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Metadata store in use
    pub fn log_store(&self) -> &Arc<dyn LogStore> {
        &self.logs
    }

    /// Index parameters applied to new writers
    pub fn index_config(&self) -> &IndexConfig {
        &self.index
    }

    /// Create a new, empty log
    pub async fn create_log(&self, log_type: LogType) -> LogResult<Log> {
        self.logs.add(log_type).await
    }

    /// Look up a log; `None` if unknown
    pub async fn get_log(&self, id: LogId) -> LogResult<Option<Log>> {
        self.logs.get(id).await
    }

    /// All logs, oldest first
    pub async fn list_logs(&self) -> LogResult<Vec<Log>> {
        self.logs.list().await
    }

    async fn require_log(&self, id: LogId) -> LogResult<Log> {
        self.logs
            .get(id)
            .await?
            .ok_or_else(|| LogError::log_not_found(id))
    }

    /// Open a writer positioned after the log's committed data
    ///
    /// Only one writer per log may be active; a second one fails on its
    /// first flush with `Conflict`.
    #[instrument(skip(self))]
    pub async fn writer(&self, id: LogId) -> LogResult<LogWriter> {
        let log = self.require_log(id).await?;
        if log.complete {
            return Err(LogError::LogComplete(id.to_string()));
        }

        let snapshot = LogSnapshot::open(self.blobs.clone(), &log.ref_name).await?;
        let builder = match snapshot.root_hash() {
            Some(_) => LogBuilder::resume(&snapshot, &self.index).await?,
            None => LogBuilder::new(&self.index),
        };
        LogWriter::new(
            log,
            builder,
            self.blobs.clone(),
            self.logs.clone(),
            snapshot.root_hash(),
        )
    }

    /// Consistent read view of a log
    pub async fn snapshot(&self, id: LogId) -> LogResult<LogSnapshot> {
        let log = self.require_log(id).await?;
        LogSnapshot::open(self.blobs.clone(), &log.ref_name).await
    }

    /// Lines of `id` containing `text`, see [`LogSnapshot::search`]
    pub async fn search(
        &self,
        id: LogId,
        text: &str,
        first_line: u64,
        max_results: usize,
        stats: &mut SearchStats,
        cancel: &CancellationToken,
    ) -> LogResult<Vec<u64>> {
        self.snapshot(id)
            .await?
            .search(text, first_line, max_results, stats, cancel)
            .await
    }

    /// Exact bytes of the log
    pub async fn read_raw(&self, id: LogId) -> LogResult<Vec<u8>> {
        self.snapshot(id).await?.read_raw().await
    }

    /// Text of up to `count` lines starting at `first_line`
    pub async fn read_lines(&self, id: LogId, first_line: u64, count: u64) -> LogResult<Vec<String>> {
        self.snapshot(id).await?.read_lines(first_line, count).await
    }

    /// Persisted size and shape of the log
    pub async fn info(&self, id: LogId) -> LogResult<LogInfo> {
        Ok(self.snapshot(id).await?.info())
    }
}
