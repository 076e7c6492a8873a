//! In-memory blob store
//!
//! Used by tests and by short-lived tooling. Reads still verify content
//! hashes so corruption behaves the same as on disk.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::traits::{validate_ref_name, BlobSink, QueuedBlobWriter};
use super::{BlobHash, BlobStore, BlobWriter, CasResult};
use crate::error::{LogError, LogResult};

#[derive(Debug, Default)]
struct MemoryInner {
    blobs: RwLock<HashMap<BlobHash, Arc<Vec<u8>>>>,
    refs: Mutex<HashMap<String, BlobHash>>,
    reads: AtomicUsize,
}

/// Blob store backed by a hash map
///
/// Clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<MemoryInner>,
}

impl MemoryBlobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs stored
    pub fn blob_count(&self) -> usize {
        self.inner.blobs.read().len()
    }

    /// Number of `read` calls served so far
    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::Relaxed)
    }

    /// Reset the read counter
    pub fn reset_read_count(&self) {
        self.inner.reads.store(0, Ordering::Relaxed);
    }

    /// Overwrite the bytes stored under `hash` without rehashing
    #[cfg(test)]
    pub(crate) fn tamper(&self, hash: BlobHash, bytes: Vec<u8>) {
        self.inner.blobs.write().insert(hash, Arc::new(bytes));
    }
}

#[async_trait]
impl BlobSink for MemoryBlobStore {
    async fn put(&self, hash: BlobHash, bytes: &[u8]) -> LogResult<()> {
        self.inner
            .blobs
            .write()
            .entry(hash)
            .or_insert_with(|| Arc::new(bytes.to_vec()));
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn open_writer(&self, ref_name: &str) -> LogResult<Box<dyn BlobWriter>> {
        Ok(Box::new(QueuedBlobWriter::new(self.clone(), ref_name)?))
    }

    async fn read(&self, hash: &BlobHash) -> LogResult<Vec<u8>> {
        self.inner.reads.fetch_add(1, Ordering::Relaxed);
        let bytes = self
            .inner
            .blobs
            .read()
            .get(hash)
            .cloned()
            .ok_or_else(|| LogError::blob_not_found(hash))?;

        let actual = BlobHash::from_content(&bytes);
        if actual != *hash {
            return Err(LogError::Corrupt {
                hash: hash.to_hex(),
                actual: actual.to_hex(),
            });
        }
        Ok(bytes.as_ref().clone())
    }

    async fn resolve_ref(&self, name: &str) -> LogResult<Option<BlobHash>> {
        validate_ref_name(name)?;
        Ok(self.inner.refs.lock().get(name).copied())
    }

    async fn update_ref(
        &self,
        name: &str,
        expected: Option<BlobHash>,
        new: BlobHash,
    ) -> LogResult<CasResult> {
        validate_ref_name(name)?;
        let mut refs = self.inner.refs.lock();
        let actual = refs.get(name).copied();
        if actual != expected {
            return Ok(CasResult::Conflict { actual });
        }
        refs.insert(name.to_string(), new);
        Ok(CasResult::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_flush_read() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/a").unwrap();

        let hash = writer.write(b"hello".to_vec()).await.unwrap();
        // Queued, not yet stored
        assert_eq!(store.blob_count(), 0);

        writer.flush().await.unwrap();
        assert_eq!(store.read(&hash).await.unwrap(), b"hello");
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_payloads_dedupe() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/a").unwrap();
        let a = writer.write(b"same".to_vec()).await.unwrap();
        let b = writer.write(b"same".to_vec()).await.unwrap();
        writer.complete().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.blob_count(), 1);
    }

    #[tokio::test]
    async fn test_write_after_complete_fails() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/a").unwrap();
        writer.complete().await.unwrap();
        assert!(writer.write(b"late".to_vec()).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_hash_not_found() {
        let store = MemoryBlobStore::new();
        let err = store
            .read(&BlobHash::from_content(b"missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_tampered_blob_is_corrupt() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/a").unwrap();
        let hash = writer.write(b"original".to_vec()).await.unwrap();
        writer.flush().await.unwrap();

        store.tamper(hash, b"0riginal".to_vec());
        let err = store.read(&hash).await.unwrap_err();
        assert!(err.is_corruption());
    }

    #[tokio::test]
    async fn test_ref_compare_and_swap() {
        let store = MemoryBlobStore::new();
        let first = BlobHash::from_content(b"1");
        let second = BlobHash::from_content(b"2");

        assert_eq!(store.resolve_ref("logs/x").await.unwrap(), None);
        assert_eq!(
            store.update_ref("logs/x", None, first).await.unwrap(),
            CasResult::Updated
        );

        // Stale expectation is rejected and reports the current value
        assert_eq!(
            store.update_ref("logs/x", None, second).await.unwrap(),
            CasResult::Conflict {
                actual: Some(first)
            }
        );

        assert_eq!(
            store.update_ref("logs/x", Some(first), second).await.unwrap(),
            CasResult::Updated
        );
        assert_eq!(store.resolve_ref("logs/x").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_invalid_ref_rejected() {
        let store = MemoryBlobStore::new();
        assert!(store.open_writer("../up").is_err());
        assert!(store.resolve_ref("").await.is_err());
    }
}
