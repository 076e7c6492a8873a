//! [`LogStore`] persisted as one JSON document per log under `<root>/logs/`

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::store::{version_conflict, LogStore};
use super::types::{Log, LogId, LogType};
use crate::error::{LogError, LogResult};
use crate::storage::write_atomic;

/// Directory-backed log metadata
#[derive(Debug, Clone)]
pub struct FileLogStore {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileLogStore {
    /// Store records under `root/logs`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join("logs"),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn record_path(&self, id: LogId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn load(&self, id: LogId) -> LogResult<Option<Log>> {
        match fs::read(self.record_path(id)).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(LogError::deserialization),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, log: &Log) -> LogResult<()> {
        let bytes = serde_json::to_vec_pretty(log).map_err(LogError::serialization)?;
        write_atomic(&self.record_path(log.id), &bytes).await
    }
}

#[async_trait]
impl LogStore for FileLogStore {
    async fn add(&self, log_type: LogType) -> LogResult<Log> {
        let log = Log::new(log_type);
        let _guard = self.lock.lock().await;
        self.save(&log).await?;
        debug!(log_id = %log.id, %log_type, dir = %self.dir.display(), "created log");
        Ok(log)
    }

    async fn get(&self, id: LogId) -> LogResult<Option<Log>> {
        self.load(id).await
    }

    async fn update_line_count(&self, log: &Log, line_count: u64, complete: bool) -> LogResult<Log> {
        let _guard = self.lock.lock().await;
        let current = self
            .load(log.id)
            .await?
            .ok_or_else(|| LogError::log_not_found(log.id))?;
        if current.version != log.version {
            return Err(version_conflict(&current));
        }

        let next = current.advanced(line_count, complete)?;
        if next.version != current.version {
            self.save(&next).await?;
        }
        Ok(next)
    }

    async fn list(&self) -> LogResult<Vec<Log>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut logs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|_| path.extension().is_some_and(|ext| ext == "json"))
                .and_then(|stem| stem.parse::<LogId>().ok());
            if let Some(log) = match id {
                Some(id) => self.load(id).await?,
                None => None,
            } {
                logs.push(log);
            }
        }
        logs.sort_by_key(|log| log.created_at);
        Ok(logs)
    }
}
