//! Filesystem blob store
//!
//! Layout under the root directory:
//!
//! ```text
//! objects/<first two hex chars>/<remaining 62 hex chars>
//! refs/<ref name>            (contains the hex hash + newline)
//! ```
//!
//! Objects and refs are written to a temporary sibling and renamed into
//! place, so readers never observe a partial file. Ref updates within one
//! process are serialized by an async mutex; the store assumes a single
//! writing process per root.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::traits::{validate_ref_name, BlobSink, QueuedBlobWriter};
use super::{BlobHash, BlobStore, BlobWriter, CasResult};
use crate::error::{LogError, LogResult};

/// Blob store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
    ref_lock: Arc<Mutex<()>>,
}

impl FileBlobStore {
    /// Use `root` as the store directory; it is created lazily
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ref_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The store directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, hash: &BlobHash) -> PathBuf {
        let hex = hash.to_hex();
        let (shard, rest) = hex.split_at(2);
        self.root.join("objects").join(shard).join(rest)
    }

    fn ref_path(&self, name: &str) -> LogResult<PathBuf> {
        validate_ref_name(name)?;
        let mut path = self.root.join("refs");
        for segment in name.split('/') {
            path.push(segment);
        }
        Ok(path)
    }
}

/// Write `bytes` to `path` through a uniquely named temporary file
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> LogResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| LogError::Io(format!("{} has no parent directory", path.display())))?;
    fs::create_dir_all(parent).await?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));
    fs::write(&temp, bytes).await?;
    if let Err(err) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(err.into());
    }
    Ok(())
}

#[async_trait]
impl BlobSink for FileBlobStore {
    async fn put(&self, hash: BlobHash, bytes: &[u8]) -> LogResult<()> {
        let path = self.object_path(&hash);
        if fs::try_exists(&path).await? {
            trace!(%hash, "object already present");
            return Ok(());
        }
        write_atomic(&path, bytes).await?;
        trace!(%hash, len = bytes.len(), "stored object");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    fn open_writer(&self, ref_name: &str) -> LogResult<Box<dyn BlobWriter>> {
        Ok(Box::new(QueuedBlobWriter::new(self.clone(), ref_name)?))
    }

    async fn read(&self, hash: &BlobHash) -> LogResult<Vec<u8>> {
        let bytes = match fs::read(self.object_path(hash)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LogError::blob_not_found(hash));
            }
            Err(err) => return Err(err.into()),
        };

        let actual = BlobHash::from_content(&bytes);
        if actual != *hash {
            return Err(LogError::Corrupt {
                hash: hash.to_hex(),
                actual: actual.to_hex(),
            });
        }
        Ok(bytes)
    }

    async fn resolve_ref(&self, name: &str) -> LogResult<Option<BlobHash>> {
        let path = self.ref_path(name)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents.parse()?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn update_ref(
        &self,
        name: &str,
        expected: Option<BlobHash>,
        new: BlobHash,
    ) -> LogResult<CasResult> {
        let path = self.ref_path(name)?;
        let _guard = self.ref_lock.lock().await;

        let actual = self.resolve_ref(name).await?;
        if actual != expected {
            debug!(ref_name = name, ?actual, ?expected, "ref update conflict");
            return Ok(CasResult::Conflict { actual });
        }

        write_atomic(&path, format!("{}\n", new.to_hex()).as_bytes()).await?;
        debug!(ref_name = name, root = %new, "ref updated");
        Ok(CasResult::Updated)
    }
}
