//! Incremental construction of a log's index tree
//!
//! Bytes accumulate in an open buffer and are cut into blocks of
//! `block_size` bytes. A flush additionally seals whatever is buffered,
//! writes the new blocks, rewrites the pages that are still open and writes
//! a new root. An unterminated last line is stored but only counted once the
//! log is complete.
//!
//! Pages fill up to `page_capacity` blocks. A full page whose blocks all have
//! final look-ahead windows is frozen: it is written one last time and only
//! its [`PageRef`] is kept afterwards.

use chunklog_config::IndexConfig;
use tracing::{debug, instrument, trace};

use super::node::{BlockSummary, IndexNode, LogIndexPage, LogNode, PageRef};
use super::reader::LogSnapshot;
use crate::error::{LogError, LogResult};
use crate::index::BlockIndex;
use crate::storage::{BlobHash, BlobWriter};

/// Root written by [`LogBuilder::flush`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushedRoot {
    /// Hash of the encoded root node
    pub hash: BlobHash,
    /// The root node itself
    pub node: LogNode,
}

#[derive(Debug)]
struct OpenBlock {
    offset: u64,
    length: u64,
    first_line: u64,
    newlines: u64,
    data: Option<BlobHash>,
    pending: Option<Vec<u8>>,
    index: BlockIndex,
}

impl OpenBlock {
    fn summary(&self) -> LogResult<BlockSummary> {
        let data = self.data.ok_or_else(|| {
            LogError::invalid_operation(format!("block at offset {} was never written", self.offset))
        })?;
        Ok(BlockSummary {
            data,
            offset: self.offset,
            length: self.length,
            first_line: self.first_line,
            newlines: self.newlines,
            lookahead_complete: self.index.is_complete(),
            trie: self.index.trie().clone(),
        })
    }
}

/// Single-writer builder for one log
#[derive(Debug)]
pub struct LogBuilder {
    block_size: usize,
    page_capacity: usize,
    buffer: Vec<u8>,
    length: u64,
    newlines: u64,
    last_byte: Option<u8>,
    frozen: Vec<PageRef>,
    open: Vec<OpenBlock>,
    complete: bool,
}

impl LogBuilder {
    /// Start an empty log
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            block_size: config.block_size.max(1),
            page_capacity: config.page_capacity.max(1),
            buffer: Vec::new(),
            length: 0,
            newlines: 0,
            last_byte: None,
            frozen: Vec::new(),
            open: Vec::new(),
            complete: false,
        }
    }

    /// Continue a log from its last flushed root
    ///
    /// Every flushed byte is recovered, including an unterminated last line.
    pub async fn resume(snapshot: &LogSnapshot, config: &IndexConfig) -> LogResult<Self> {
        let root = snapshot.node();
        if root.complete {
            return Err(LogError::invalid_operation("cannot resume a completed log"));
        }

        let mut builder = Self::new(config);
        builder.length = root.length;
        builder.newlines = root.newlines();
        builder.last_byte = match (root.length, root.partial_line) {
            (0, _) => None,
            (_, true) => Some(0),
            (_, false) => Some(b'\n'),
        };

        let mut summaries = Vec::new();
        for page in &root.pages {
            if page.frozen {
                if !summaries.is_empty() {
                    return Err(LogError::deserialization(
                        "frozen page follows an open page",
                    ));
                }
                builder.frozen.push(page.clone());
            } else {
                summaries.extend(snapshot.load_page(page).await?.blocks);
            }
        }

        // Blocks still waiting on look-ahead need their own bytes and what follows them
        let first_pending = summaries
            .iter()
            .position(|summary| !summary.lookahead_complete)
            .unwrap_or(summaries.len());
        let mut contents = Vec::with_capacity(summaries.len() - first_pending);
        for summary in &summaries[first_pending..] {
            contents.push(snapshot.load_block(summary).await?);
        }

        for (position, summary) in summaries.into_iter().enumerate() {
            let index = if summary.lookahead_complete {
                BlockIndex::finished(summary.trie)
            } else {
                let local = position - first_pending;
                let follow: Vec<u8> = contents[local + 1..]
                    .iter()
                    .flat_map(|bytes| bytes.iter().copied())
                    .take(crate::index::SHINGLE_LEN - 1)
                    .collect();
                BlockIndex::resume(summary.trie, &contents[local], &follow)
            };
            builder.open.push(OpenBlock {
                offset: summary.offset,
                length: summary.length,
                first_line: summary.first_line,
                newlines: summary.newlines,
                data: Some(summary.data),
                pending: None,
                index,
            });
        }

        debug!(
            length = builder.length,
            frozen_pages = builder.frozen.len(),
            open_blocks = builder.open.len(),
            "resumed log builder"
        );
        Ok(builder)
    }

    /// Append raw bytes
    pub fn write_data(&mut self, mut bytes: &[u8]) -> LogResult<()> {
        if self.complete {
            return Err(LogError::invalid_operation("log builder is complete"));
        }
        while !bytes.is_empty() {
            let take = (self.block_size - self.buffer.len()).min(bytes.len());
            self.buffer.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
            if self.buffer.len() >= self.block_size {
                let block = std::mem::take(&mut self.buffer);
                self.seal(block, false);
            }
        }
        Ok(())
    }

    fn seal(&mut self, data: Vec<u8>, last: bool) {
        if data.is_empty() {
            return;
        }
        for block in &mut self.open {
            block.index.observe(&data);
        }

        let newlines = data.iter().filter(|&&b| b == b'\n').count() as u64;
        let length = data.len() as u64;
        trace!(offset = self.length, length, newlines, "sealed block");

        self.open.push(OpenBlock {
            offset: self.length,
            length,
            first_line: self.newlines,
            newlines,
            data: None,
            index: BlockIndex::build(&data, &[], last),
            pending: None,
        });
        self.last_byte = data.last().copied();
        self.length += length;
        self.newlines += newlines;
        if let Some(block) = self.open.last_mut() {
            block.pending = Some(data);
        }
    }

    /// Persist sealed blocks and a new root through `writer`
    ///
    /// Every buffered byte is sealed. With `complete` set the trailing
    /// partial line (if any) becomes the last line and further writes fail.
    #[instrument(skip(self, writer), fields(ref_name = writer.ref_name()))]
    pub async fn flush(&mut self, writer: &mut dyn BlobWriter, complete: bool) -> LogResult<FlushedRoot> {
        if self.complete {
            return Err(LogError::invalid_operation("log builder is complete"));
        }

        // A trailing partial line is committed as data but not yet counted
        let rest = std::mem::take(&mut self.buffer);
        self.seal(rest, complete);
        if complete {
            for block in &mut self.open {
                block.index.finish();
            }
        }

        let mut written = 0usize;
        for block in &mut self.open {
            if let Some(bytes) = &block.pending {
                block.data = Some(writer.write(bytes.clone()).await?);
                block.pending = None;
                written += 1;
            }
            block.index.refresh();
        }

        while self.open.len() >= self.page_capacity
            && self.open[..self.page_capacity]
                .iter()
                .all(|block| block.index.is_complete())
        {
            let page = write_page(writer, &self.open[..self.page_capacity], true).await?;
            self.open.drain(..self.page_capacity);
            debug!(page = self.frozen.len(), hash = %page.hash, "froze index page");
            self.frozen.push(page);
        }

        let mut pages = self.frozen.clone();
        for chunk in self.open.chunks(self.page_capacity) {
            pages.push(write_page(writer, chunk, false).await?);
        }

        let partial_line = matches!(self.last_byte, Some(byte) if byte != b'\n');
        let node = LogNode {
            length: self.length,
            line_count: self.newlines + u64::from(complete && partial_line),
            complete,
            partial_line,
            pages,
        };
        let hash = writer.write(node.encode()?).await?;
        writer.flush().await?;
        self.complete = complete;

        debug!(
            root = %hash,
            blocks_written = written,
            length = node.length,
            line_count = node.line_count,
            complete,
            "flushed log"
        );
        Ok(FlushedRoot { hash, node })
    }

    /// Bytes sealed into blocks so far
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Newlines sealed into blocks so far
    pub fn line_count(&self) -> u64 {
        self.newlines
    }

    /// Bytes waiting in the open buffer
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// True after a completing flush
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

async fn write_page(writer: &mut dyn BlobWriter, blocks: &[OpenBlock], frozen: bool) -> LogResult<PageRef> {
    let summaries = blocks
        .iter()
        .map(OpenBlock::summary)
        .collect::<LogResult<Vec<_>>>()?;
    let (offset, first_line) = summaries
        .first()
        .map(|first| (first.offset, first.first_line))
        .unwrap_or_default();
    let length = summaries.iter().map(|block| block.length).sum();
    let newlines = summaries.iter().map(|block| block.newlines).sum();
    let num_blocks = summaries.len() as u32;

    let page = LogIndexPage { blocks: summaries };
    let hash = writer.write(page.encode()?).await?;
    Ok(PageRef {
        hash,
        offset,
        length,
        first_line,
        newlines,
        num_blocks,
        frozen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BlobStore, MemoryBlobStore};
    use std::sync::Arc;

    fn config(block_size: usize, page_capacity: usize) -> IndexConfig {
        IndexConfig::default()
            .with_block_size(block_size)
            .with_page_capacity(page_capacity)
    }

    #[tokio::test]
    async fn test_blocks_cut_at_block_size() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/t").unwrap();
        let mut builder = LogBuilder::new(&config(4, 8));

        builder.write_data(b"abcdefghij").unwrap();
        assert_eq!(builder.length(), 8);
        assert_eq!(builder.buffered_len(), 2);

        let root = builder.flush(writer.as_mut(), true).await.unwrap();
        assert_eq!(root.node.length, 10);
        assert_eq!(root.node.block_count(), 3);
        // Trailing text without a newline counts once complete
        assert_eq!(root.node.line_count, 1);
        assert!(root.node.partial_line);
    }

    #[tokio::test]
    async fn test_partial_line_committed_but_not_counted() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/t").unwrap();
        let mut builder = LogBuilder::new(&config(1024, 8));

        builder.write_data(b"one\ntwo\nthr").unwrap();
        let root = builder.flush(writer.as_mut(), false).await.unwrap();
        assert_eq!(root.node.line_count, 2);
        assert_eq!(root.node.length, 11);
        assert!(root.node.partial_line);
        assert_eq!(builder.buffered_len(), 0);

        builder.write_data(b"ee\n").unwrap();
        let root = builder.flush(writer.as_mut(), false).await.unwrap();
        assert_eq!(root.node.line_count, 3);
        assert_eq!(root.node.length, 14);
        assert!(!root.node.partial_line);
        assert_eq!(root.node.block_count(), 2);
    }

    #[tokio::test]
    async fn test_resume_after_partial_line() {
        let store = Arc::new(MemoryBlobStore::new());
        let cfg = config(64, 4);

        let mut writer = store.open_writer("logs/p").unwrap();
        let mut builder = LogBuilder::new(&cfg);
        builder.write_data(b"abc").unwrap();
        let root = builder.flush(writer.as_mut(), false).await.unwrap();
        assert_eq!(root.node.line_count, 0);
        store.update_ref("logs/p", None, root.hash).await.unwrap();

        let snapshot = LogSnapshot::open(store.clone(), "logs/p").await.unwrap();
        let mut resumed = LogBuilder::resume(&snapshot, &cfg).await.unwrap();
        assert_eq!(resumed.length(), 3);

        let mut writer = store.open_writer("logs/p").unwrap();
        resumed.write_data(b"def\n").unwrap();
        let next = resumed.flush(writer.as_mut(), true).await.unwrap();
        store.update_ref("logs/p", Some(root.hash), next.hash).await.unwrap();
        assert_eq!(next.node.line_count, 1);

        let snapshot = LogSnapshot::open(store.clone(), "logs/p").await.unwrap();
        assert_eq!(snapshot.read_raw().await.unwrap(), b"abcdef\n".to_vec());
    }

    #[tokio::test]
    async fn test_full_pages_freeze() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/t").unwrap();
        let mut builder = LogBuilder::new(&config(4, 2));

        builder.write_data(b"aaa\nbbb\nccc\nddd\neee\n").unwrap();
        let first = builder.flush(writer.as_mut(), false).await.unwrap();
        assert_eq!(first.node.pages.len(), 3);
        assert!(first.node.pages[0].frozen);
        assert!(first.node.pages[1].frozen);
        assert!(!first.node.pages[2].frozen);

        builder.write_data(b"fff\n").unwrap();
        let second = builder.flush(writer.as_mut(), false).await.unwrap();
        // Frozen pages are reused as-is
        assert_eq!(second.node.pages[0], first.node.pages[0]);
        assert_eq!(second.node.pages[1], first.node.pages[1]);
        assert_eq!(second.node.pages[2].num_blocks, 2);
    }

    #[tokio::test]
    async fn test_page_waits_for_lookahead() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/t").unwrap();
        let mut builder = LogBuilder::new(&config(4, 1));

        builder.write_data(b"abcd").unwrap();
        let root = builder.flush(writer.as_mut(), false).await.unwrap();
        assert!(!root.node.pages[0].frozen);

        builder.write_data(b"efghijkl").unwrap();
        let root = builder.flush(writer.as_mut(), false).await.unwrap();
        assert!(root.node.pages[0].frozen);
    }

    #[tokio::test]
    async fn test_writes_after_complete_fail() {
        let store = MemoryBlobStore::new();
        let mut writer = store.open_writer("logs/t").unwrap();
        let mut builder = LogBuilder::new(&config(16, 4));
        builder.write_data(b"done\n").unwrap();
        builder.flush(writer.as_mut(), true).await.unwrap();

        assert!(builder.is_complete());
        assert!(builder.write_data(b"more").is_err());
        assert!(builder.flush(writer.as_mut(), true).await.is_err());
    }

    #[tokio::test]
    async fn test_resume_continues_numbering() {
        let store = Arc::new(MemoryBlobStore::new());
        let cfg = config(4, 2);

        let mut writer = store.open_writer("logs/r").unwrap();
        let mut builder = LogBuilder::new(&cfg);
        builder.write_data(b"ab\ncdefg").unwrap();
        let root = builder.flush(writer.as_mut(), false).await.unwrap();
        store.update_ref("logs/r", None, root.hash).await.unwrap();

        let snapshot = LogSnapshot::open(store.clone(), "logs/r").await.unwrap();
        let mut resumed = LogBuilder::resume(&snapshot, &cfg).await.unwrap();
        assert_eq!(resumed.length(), root.node.length);
        assert_eq!(resumed.line_count(), 1);

        let mut writer = store.open_writer("logs/r").unwrap();
        resumed.write_data(b"h\nij\n").unwrap();
        let next = resumed.flush(writer.as_mut(), true).await.unwrap();
        assert_eq!(next.node.line_count, 3);
        assert_eq!(next.node.length, root.node.length + 5);
    }
}
