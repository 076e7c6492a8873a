//! Blob store boundary
//!
//! The engine only needs three things from persistence: a writer that turns
//! payloads into content hashes, read-by-hash returning the exact bytes
//! written, and an atomic compare-and-swap on named refs. Nothing is ever
//! mutated in place.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;

use super::BlobHash;
use crate::error::{LogError, LogResult};

/// Outcome of [`BlobStore::update_ref`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasResult {
    /// The ref now points at the new hash
    Updated,
    /// The ref did not hold the expected value; nothing was changed
    Conflict {
        /// What the ref currently points at
        actual: Option<BlobHash>,
    },
}

/// Content-addressed storage of immutable blobs plus named refs
#[async_trait]
pub trait BlobStore: Debug + Send + Sync {
    /// Open a writer whose output will eventually be published under `ref_name`
    fn open_writer(&self, ref_name: &str) -> LogResult<Box<dyn BlobWriter>>;

    /// Read a blob, verifying that its bytes hash to `hash`
    ///
    /// Returns `NotFound` for unknown hashes and `Corrupt` on mismatch.
    async fn read(&self, hash: &BlobHash) -> LogResult<Vec<u8>>;

    /// Current target of a ref, or `None` if it has never been set
    async fn resolve_ref(&self, name: &str) -> LogResult<Option<BlobHash>>;

    /// Atomically repoint `name` at `new` if it currently holds `expected`
    async fn update_ref(
        &self,
        name: &str,
        expected: Option<BlobHash>,
        new: BlobHash,
    ) -> LogResult<CasResult>;
}

/// Handle accepting payloads for one ref
///
/// `write` hashes immediately and may defer I/O; payloads are durable once
/// `flush` (or `complete`) returns.
#[async_trait]
pub trait BlobWriter: Send {
    /// Queue a payload and return its content hash
    async fn write(&mut self, payload: Vec<u8>) -> LogResult<BlobHash>;

    /// Persist everything queued so far
    async fn flush(&mut self) -> LogResult<()>;

    /// Flush and close; later writes fail
    async fn complete(&mut self) -> LogResult<()>;

    /// Ref this writer was opened for
    fn ref_name(&self) -> &str;
}

/// Raw put of an already-hashed blob, implemented by each backend
#[async_trait]
pub(crate) trait BlobSink: Send + Sync {
    async fn put(&self, hash: BlobHash, bytes: &[u8]) -> LogResult<()>;
}

/// Writer shared by the backends: hashes on `write`, stores on `flush`
pub(crate) struct QueuedBlobWriter<S> {
    sink: S,
    ref_name: String,
    queued: VecDeque<(BlobHash, Vec<u8>)>,
    seen: HashSet<BlobHash>,
    closed: bool,
}

impl<S: BlobSink> QueuedBlobWriter<S> {
    pub(crate) fn new(sink: S, ref_name: &str) -> LogResult<Self> {
        validate_ref_name(ref_name)?;
        Ok(Self {
            sink,
            ref_name: ref_name.to_string(),
            queued: VecDeque::new(),
            seen: HashSet::new(),
            closed: false,
        })
    }
}

#[async_trait]
impl<S: BlobSink> BlobWriter for QueuedBlobWriter<S> {
    async fn write(&mut self, payload: Vec<u8>) -> LogResult<BlobHash> {
        if self.closed {
            return Err(LogError::invalid_operation(format!(
                "writer for {} is complete",
                self.ref_name
            )));
        }
        let hash = BlobHash::from_content(&payload);
        // Identical payloads share an address
        if self.seen.insert(hash) {
            self.queued.push_back((hash, payload));
        }
        Ok(hash)
    }

    async fn flush(&mut self) -> LogResult<()> {
        // Pop only after a successful put so a failure leaves the rest queued
        while let Some((hash, bytes)) = self.queued.front() {
            self.sink.put(*hash, bytes).await?;
            self.queued.pop_front();
        }
        // Stored blobs no longer need deduplicating
        self.seen.clear();
        Ok(())
    }

    async fn complete(&mut self) -> LogResult<()> {
        self.flush().await?;
        self.closed = true;
        Ok(())
    }

    fn ref_name(&self) -> &str {
        &self.ref_name
    }
}

/// Ref names are `/`-separated segments of `[A-Za-z0-9._-]`, without `.`/`..`
pub fn validate_ref_name(name: &str) -> LogResult<()> {
    let valid = !name.is_empty()
        && name.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        });
    if valid {
        Ok(())
    } else {
        Err(LogError::InvalidRef(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct RecordingSink {
        puts: Arc<Mutex<Vec<BlobHash>>>,
    }

    #[async_trait]
    impl BlobSink for RecordingSink {
        async fn put(&self, hash: BlobHash, _bytes: &[u8]) -> LogResult<()> {
            self.puts.lock().push(hash);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dedupe_set_released_after_flush() {
        let sink = RecordingSink::default();
        let mut writer = QueuedBlobWriter::new(sink.clone(), "logs/q").unwrap();

        let first = writer.write(b"root v1".to_vec()).await.unwrap();
        writer.write(b"root v1".to_vec()).await.unwrap();
        writer.write(b"page".to_vec()).await.unwrap();
        assert_eq!(writer.queued.len(), 2);

        writer.flush().await.unwrap();
        assert!(writer.queued.is_empty());
        assert!(writer.seen.is_empty());
        assert_eq!(sink.puts.lock().len(), 2);

        // A payload written again after a flush is stored again, which is harmless
        let again = writer.write(b"root v1".to_vec()).await.unwrap();
        assert_eq!(again, first);
        writer.flush().await.unwrap();
        assert_eq!(sink.puts.lock().len(), 3);
        assert!(writer.seen.is_empty());
    }

    #[test]
    fn test_ref_name_validation() {
        assert!(validate_ref_name("logs/0f3a-11").is_ok());
        assert!(validate_ref_name("a.b_c-d").is_ok());
        assert!(validate_ref_name("").is_err());
        assert!(validate_ref_name("logs/../etc").is_err());
        assert!(validate_ref_name("/abs").is_err());
        assert!(validate_ref_name("logs//x").is_err());
        assert!(validate_ref_name("space here").is_err());
    }
}
