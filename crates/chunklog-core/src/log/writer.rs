//! Append handle for one log
//!
//! A flush runs in a fixed order: blocks, pages and root are written and made
//! durable, then the log's ref is moved by compare-and-swap, then the
//! metadata line count is updated. A reader that sees the new line count can
//! therefore always find the data behind it.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::builder::{FlushedRoot, LogBuilder};
use super::store::LogStore;
use super::types::Log;
use crate::error::{LogError, LogResult};
use crate::storage::{BlobHash, BlobStore, BlobWriter, CasResult};

/// Exclusive writer for a single log
pub struct LogWriter {
    log: Log,
    builder: LogBuilder,
    blobs: Box<dyn BlobWriter>,
    store: Arc<dyn BlobStore>,
    logs: Arc<dyn LogStore>,
    root: Option<BlobHash>,
    // Final root of a completion that has not been published yet
    sealed: Option<FlushedRoot>,
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("log", &self.log.id)
            .field("root", &self.root)
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

impl LogWriter {
    /// Wrap `builder`, whose committed state is the tree at `root`
    pub fn new(
        log: Log,
        builder: LogBuilder,
        store: Arc<dyn BlobStore>,
        logs: Arc<dyn LogStore>,
        root: Option<BlobHash>,
    ) -> LogResult<Self> {
        if log.complete {
            return Err(LogError::LogComplete(log.id.to_string()));
        }
        let blobs = store.open_writer(&log.ref_name)?;
        Ok(Self {
            log,
            builder,
            blobs,
            store,
            logs,
            root,
            sealed: None,
        })
    }

    /// Latest metadata handle
    pub fn log(&self) -> &Log {
        &self.log
    }

    /// Hash of the last published root
    pub fn root(&self) -> Option<BlobHash> {
        self.root
    }

    /// Append bytes; nothing is visible to readers until the next flush
    pub fn write_data(&mut self, bytes: &[u8]) -> LogResult<()> {
        if self.log.complete {
            return Err(LogError::LogComplete(self.log.id.to_string()));
        }
        self.builder.write_data(bytes)
    }

    /// Commit everything written so far and return the updated handle
    ///
    /// If a completing flush fails after the final root was built, calling
    /// `flush(true)` again publishes that same root.
    #[instrument(skip(self), fields(log_id = %self.log.id))]
    pub async fn flush(&mut self, complete: bool) -> LogResult<Log> {
        if self.log.complete {
            if complete {
                return Ok(self.log.clone());
            }
            return Err(LogError::LogComplete(self.log.id.to_string()));
        }

        // A failed completion is retried from the root it already built
        let flushed = match (&self.sealed, complete) {
            (Some(sealed), true) => sealed.clone(),
            _ => self.builder.flush(self.blobs.as_mut(), complete).await?,
        };
        if complete {
            self.sealed = Some(flushed.clone());
            self.blobs.complete().await?;
        }

        if self.root != Some(flushed.hash) {
            match self
                .store
                .update_ref(&self.log.ref_name, self.root, flushed.hash)
                .await?
            {
                CasResult::Updated => self.root = Some(flushed.hash),
                CasResult::Conflict { actual } => {
                    warn!(ref_name = %self.log.ref_name, ?actual, "log ref moved underneath writer");
                    return Err(LogError::Conflict {
                        name: self.log.ref_name.clone(),
                        actual: actual.map_or_else(|| "unset".to_string(), |hash| hash.to_hex()),
                    });
                }
            }
        }

        self.log = self
            .logs
            .update_line_count(&self.log, flushed.node.line_count, complete)
            .await?;
        self.sealed = None;
        if complete {
            info!(
                line_count = self.log.line_count,
                length = flushed.node.length,
                "log complete"
            );
        }
        Ok(self.log.clone())
    }

    /// Flush with `complete` set and give up the writer
    pub async fn complete(mut self) -> LogResult<Log> {
        self.flush(true).await
    }
}
