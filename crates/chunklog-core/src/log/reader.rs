//! Point-in-time views of a log
//!
//! A [`LogSnapshot`] resolves the log's ref exactly once. Everything it reads
//! afterwards is immutable, so concurrent flushes never change what an open
//! snapshot sees.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::node::{BlockSummary, IndexNode, LogIndexPage, LogNode, PageRef};
use crate::error::{LogError, LogResult};
use crate::storage::{BlobHash, BlobStore};

/// Summary of a log's persisted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogInfo {
    /// Root node hash, `None` before the first flush
    pub root: Option<BlobHash>,
    /// Bytes of indexed data
    pub length: u64,
    /// Committed lines
    pub line_count: u64,
    /// Completion flag
    pub complete: bool,
    /// Index pages
    pub pages: u64,
    /// Data blocks
    pub blocks: u64,
}

/// Immutable view of a log as of one ref resolution
#[derive(Debug, Clone)]
pub struct LogSnapshot {
    store: Arc<dyn BlobStore>,
    root: Option<BlobHash>,
    node: LogNode,
}

impl LogSnapshot {
    /// Resolve `ref_name` and load the root it points at
    ///
    /// An unset ref yields an empty snapshot.
    pub async fn open(store: Arc<dyn BlobStore>, ref_name: &str) -> LogResult<Self> {
        let root = store.resolve_ref(ref_name).await?;
        let node = match root {
            Some(hash) => LogNode::decode(&store.read(&hash).await?)?,
            None => LogNode::default(),
        };
        Ok(Self { store, root, node })
    }

    /// The root node
    pub fn node(&self) -> &LogNode {
        &self.node
    }

    /// Hash of the root node
    pub fn root_hash(&self) -> Option<BlobHash> {
        self.root
    }

    /// Committed lines
    pub fn line_count(&self) -> u64 {
        self.node.line_count
    }

    /// Bytes of indexed data
    pub fn length(&self) -> u64 {
        self.node.length
    }

    /// Whether the log was complete at snapshot time
    pub fn is_complete(&self) -> bool {
        self.node.complete
    }

    /// Describe the snapshot
    pub fn info(&self) -> LogInfo {
        LogInfo {
            root: self.root,
            length: self.node.length,
            line_count: self.node.line_count,
            complete: self.node.complete,
            pages: self.node.pages.len() as u64,
            blocks: self.node.block_count(),
        }
    }

    pub(crate) async fn load_page(&self, page: &PageRef) -> LogResult<LogIndexPage> {
        let decoded = LogIndexPage::decode(&self.store.read(&page.hash).await?)?;
        if decoded.blocks.len() != page.num_blocks as usize {
            return Err(LogError::deserialization(format!(
                "page {} holds {} blocks, root says {}",
                page.hash,
                decoded.blocks.len(),
                page.num_blocks
            )));
        }
        Ok(decoded)
    }

    pub(crate) async fn load_block(&self, block: &BlockSummary) -> LogResult<Vec<u8>> {
        let bytes = self.store.read(&block.data).await?;
        if bytes.len() as u64 != block.length {
            return Err(LogError::deserialization(format!(
                "block {} is {} bytes, index says {}",
                block.data,
                bytes.len(),
                block.length
            )));
        }
        Ok(bytes)
    }

    /// Every indexed byte, in order
    #[instrument(skip(self), fields(length = self.node.length))]
    pub async fn read_raw(&self) -> LogResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.node.length as usize);
        for page_ref in &self.node.pages {
            let page = self.load_page(page_ref).await?;
            for block in &page.blocks {
                out.extend_from_slice(&self.load_block(block).await?);
            }
        }
        Ok(out)
    }

    /// Text of lines `[first_line, first_line + count)`, without newlines
    ///
    /// Only the blocks those lines touch are read. Lines past the committed
    /// line count are not returned.
    #[instrument(skip(self))]
    pub async fn read_lines(&self, first_line: u64, count: u64) -> LogResult<Vec<String>> {
        let end_line = first_line.saturating_add(count).min(self.node.line_count);
        if first_line >= end_line {
            return Ok(Vec::new());
        }

        // Line N starts just after newline N-1
        let start_newline = first_line.checked_sub(1);
        let mut text = Vec::new();
        let mut text_first_line = None;

        'pages: for page_ref in &self.node.pages {
            if start_newline.is_some_and(|newline| page_ref.end_line() <= newline) {
                continue;
            }
            let page = self.load_page(page_ref).await?;
            for block in &page.blocks {
                if start_newline.is_some_and(|newline| block.first_line + block.newlines <= newline) {
                    continue;
                }
                text_first_line.get_or_insert(block.first_line);
                text.extend_from_slice(&self.load_block(block).await?);
                if block.first_line + block.newlines >= end_line {
                    break 'pages;
                }
            }
        }

        let skip = first_line - text_first_line.unwrap_or(first_line);
        let lines: Vec<String> = text
            .split(|&b| b == b'\n')
            .skip(skip as usize)
            .take((end_line - first_line) as usize)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();
        debug!(returned = lines.len(), "read lines");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;

    #[tokio::test]
    async fn test_unset_ref_is_empty() {
        let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let snapshot = LogSnapshot::open(store, "logs/none").await.unwrap();
        assert_eq!(snapshot.line_count(), 0);
        assert!(snapshot.read_raw().await.unwrap().is_empty());
        assert!(snapshot.read_lines(0, 10).await.unwrap().is_empty());
        assert_eq!(snapshot.info().root, None);
    }
}
