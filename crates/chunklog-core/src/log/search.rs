//! Substring search over a log snapshot
//!
//! Each block's trie is checked against the query's leading shingle. Blocks
//! that cannot contain the query are skipped without being read; the rest
//! are loaded and compared literally, ignoring ASCII case. A match may run
//! past the end of the block it starts in, so the following blocks are
//! loaded as needed to supply `query.len() - 1` bytes of look-ahead.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::node::LogIndexPage;
use super::reader::LogSnapshot;
use crate::error::{LogError, LogResult};
use crate::index::{find_folded, ShingleFilter};

/// Work counters for one search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Blocks whose bytes were compared against the query
    pub num_scanned_blocks: u64,
    /// Blocks ruled out by their trie
    pub num_skipped_blocks: u64,
    /// Scanned blocks in which no match started
    pub num_false_positive_blocks: u64,
}

impl std::ops::AddAssign for SearchStats {
    fn add_assign(&mut self, other: Self) {
        self.num_scanned_blocks += other.num_scanned_blocks;
        self.num_skipped_blocks += other.num_skipped_blocks;
        self.num_false_positive_blocks += other.num_false_positive_blocks;
    }
}

type BlockPos = (usize, usize);

/// Lazily loaded pages and blocks for a single search
struct SearchCursor<'a> {
    snapshot: &'a LogSnapshot,
    cancel: &'a CancellationToken,
    pages: BTreeMap<usize, Arc<LogIndexPage>>,
    blocks: BTreeMap<BlockPos, Arc<Vec<u8>>>,
}

impl<'a> SearchCursor<'a> {
    fn new(snapshot: &'a LogSnapshot, cancel: &'a CancellationToken) -> Self {
        Self {
            snapshot,
            cancel,
            pages: BTreeMap::new(),
            blocks: BTreeMap::new(),
        }
    }

    fn check_cancelled(&self) -> LogResult<()> {
        if self.cancel.is_cancelled() {
            Err(LogError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn page(&mut self, index: usize) -> LogResult<Arc<LogIndexPage>> {
        if let Some(page) = self.pages.get(&index) {
            return Ok(page.clone());
        }
        self.check_cancelled()?;
        let page_ref = self.snapshot.node().pages.get(index).ok_or_else(|| {
            LogError::invalid_operation(format!("page {} out of range", index))
        })?;
        let page = Arc::new(self.snapshot.load_page(page_ref).await?);
        self.pages.insert(index, page.clone());
        Ok(page)
    }

    async fn block(&mut self, pos: BlockPos) -> LogResult<Arc<Vec<u8>>> {
        if let Some(bytes) = self.blocks.get(&pos) {
            return Ok(bytes.clone());
        }
        let page = self.page(pos.0).await?;
        let summary = page.blocks.get(pos.1).ok_or_else(|| {
            LogError::invalid_operation(format!("block {:?} out of range", pos))
        })?;
        self.check_cancelled()?;
        let bytes = Arc::new(self.snapshot.load_block(summary).await?);
        self.blocks.insert(pos, bytes.clone());
        Ok(bytes)
    }

    fn next_pos(&self, (page, block): BlockPos) -> Option<BlockPos> {
        let pages = &self.snapshot.node().pages;
        if block + 1 < pages.get(page)?.num_blocks as usize {
            Some((page, block + 1))
        } else if page + 1 < pages.len() {
            Some((page + 1, 0))
        } else {
            None
        }
    }

    /// Up to `needed` bytes following `pos`, stopping at the first newline
    async fn following(&mut self, pos: BlockPos, needed: usize) -> LogResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut current = pos;
        while out.len() < needed {
            let Some(next) = self.next_pos(current) else {
                break;
            };
            let bytes = self.block(next).await?;
            let take = (needed - out.len()).min(bytes.len());
            out.extend_from_slice(&bytes[..take]);
            if bytes[..take].contains(&b'\n') {
                break;
            }
            current = next;
        }
        Ok(out)
    }

    /// Drop cached data for everything before `pos`
    fn evict_before(&mut self, pos: BlockPos) {
        self.blocks = self.blocks.split_off(&pos);
        self.pages = self.pages.split_off(&pos.0);
    }
}

impl LogSnapshot {
    /// Find lines containing `text`, ignoring ASCII case
    ///
    /// Returns at most `max_results` distinct line numbers, ascending, all at
    /// or after `first_line`. `stats` is updated as blocks are processed and
    /// keeps its counts if the search is cancelled.
    #[instrument(skip(self, stats, cancel), fields(root = ?self.root_hash()))]
    pub async fn search(
        &self,
        text: &str,
        first_line: u64,
        max_results: usize,
        stats: &mut SearchStats,
        cancel: &CancellationToken,
    ) -> LogResult<Vec<u64>> {
        let query = text.as_bytes();
        let line_end = self.line_count();
        let filter = match ShingleFilter::for_query(query) {
            Some(filter) if !query.contains(&b'\n') => filter,
            _ => return Ok(Vec::new()),
        };
        if max_results == 0 || first_line >= line_end {
            return Ok(Vec::new());
        }

        let mut cursor = SearchCursor::new(self, cancel);
        let mut results: Vec<u64> = Vec::new();

        for (page_index, page_ref) in self.node().pages.iter().enumerate() {
            if page_ref.first_line >= line_end {
                break;
            }
            if page_ref.end_line() < first_line {
                continue;
            }

            let page = cursor.page(page_index).await?;
            for (block_index, block) in page.blocks.iter().enumerate() {
                if block.first_line >= line_end {
                    break;
                }
                if block.first_line + block.newlines < first_line {
                    continue;
                }
                cursor.check_cancelled()?;

                if !filter.may_match(&block.trie) {
                    stats.num_skipped_blocks += 1;
                    continue;
                }

                let pos = (page_index, block_index);
                let data = cursor.block(pos).await?;
                stats.num_scanned_blocks += 1;

                let lookahead = if data.last() == Some(&b'\n') {
                    Vec::new()
                } else {
                    cursor.following(pos, query.len() - 1).await?
                };
                let haystack: Cow<'_, [u8]> = if lookahead.is_empty() {
                    Cow::Borrowed(data.as_slice())
                } else {
                    let mut joined = data.to_vec();
                    joined.extend_from_slice(&lookahead);
                    Cow::Owned(joined)
                };

                let mut matched = false;
                let mut line = block.first_line;
                let mut counted_to = 0;
                for offset in find_folded(&haystack, query) {
                    if offset >= data.len() {
                        break;
                    }
                    matched = true;
                    line += data[counted_to..offset].iter().filter(|&&b| b == b'\n').count() as u64;
                    counted_to = offset;
                    if line >= line_end {
                        break;
                    }
                    if line < first_line || results.last() == Some(&line) {
                        continue;
                    }
                    results.push(line);
                    if results.len() >= max_results {
                        debug!(results = results.len(), ?stats, "search hit result limit");
                        return Ok(results);
                    }
                }
                if !matched {
                    stats.num_false_positive_blocks += 1;
                }
                cursor.evict_before((page_index, block_index + 1));
            }
        }

        debug!(results = results.len(), ?stats, "search finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut total = SearchStats::default();
        total += SearchStats {
            num_scanned_blocks: 1,
            num_skipped_blocks: 2,
            num_false_positive_blocks: 0,
        };
        total += SearchStats {
            num_scanned_blocks: 1,
            num_skipped_blocks: 0,
            num_false_positive_blocks: 1,
        };
        assert_eq!(total.num_scanned_blocks, 2);
        assert_eq!(total.num_skipped_blocks, 2);
        assert_eq!(total.num_false_positive_blocks, 1);
    }
}
