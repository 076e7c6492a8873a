//! Log metadata store
//!
//! Keeps the small mutable record per log (line count, completion flag).
//! Updates use optimistic concurrency: the caller passes the handle it last
//! saw, and the store refuses the update if someone else got there first.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::types::{Log, LogId, LogType};
use crate::error::{LogError, LogResult};

/// Persistence for [`Log`] records
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Create a new, empty log
    async fn add(&self, log_type: LogType) -> LogResult<Log>;

    /// Look up a log; `None` if it does not exist
    async fn get(&self, id: LogId) -> LogResult<Option<Log>>;

    /// Record a new line count, returning the updated handle
    ///
    /// Fails with `Conflict` if `log` is not the latest version, `LogComplete`
    /// if the log was already completed with a different count, and
    /// `InvalidOperation` if the count would decrease.
    async fn update_line_count(&self, log: &Log, line_count: u64, complete: bool) -> LogResult<Log>;

    /// All known logs, oldest first
    async fn list(&self) -> LogResult<Vec<Log>>;
}

pub(crate) fn version_conflict(current: &Log) -> LogError {
    LogError::Conflict {
        name: current.id.to_string(),
        actual: format!("version {}", current.version),
    }
}

/// In-memory [`LogStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    logs: Arc<RwLock<HashMap<LogId, Log>>>,
}

impl MemoryLogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn add(&self, log_type: LogType) -> LogResult<Log> {
        let log = Log::new(log_type);
        self.logs.write().insert(log.id, log.clone());
        debug!(log_id = %log.id, %log_type, "created log");
        Ok(log)
    }

    async fn get(&self, id: LogId) -> LogResult<Option<Log>> {
        Ok(self.logs.read().get(&id).cloned())
    }

    async fn update_line_count(&self, log: &Log, line_count: u64, complete: bool) -> LogResult<Log> {
        let mut logs = self.logs.write();
        let current = logs
            .get(&log.id)
            .ok_or_else(|| LogError::log_not_found(log.id))?;
        if current.version != log.version {
            return Err(version_conflict(current));
        }

        let next = current.advanced(line_count, complete)?;
        logs.insert(next.id, next.clone());
        Ok(next)
    }

    async fn list(&self) -> LogResult<Vec<Log>> {
        let mut logs: Vec<Log> = self.logs.read().values().cloned().collect();
        logs.sort_by_key(|log| log.created_at);
        Ok(logs)
    }
}
