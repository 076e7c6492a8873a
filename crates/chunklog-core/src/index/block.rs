//! Per-block shingle index
//!
//! A block's trie holds the key of every window that starts inside the
//! block. The last `SHINGLE_LEN - 1` windows reach past the block end and
//! take their remaining bytes from whatever follows it. While fewer than
//! `SHINGLE_LEN - 1` following bytes are known, the block keeps its tail and
//! collects later bytes through [`BlockIndex::observe`]; [`BlockIndex::refresh`]
//! then adds the corrected keys. Earlier padded keys stay in the trie and
//! can only cause false positives.

use super::shingle::{window_keys, SHINGLE_LEN};
use crate::trie::{ReadOnlyTrie, ReadOnlyTrieBuilder};

const LOOKAHEAD: usize = SHINGLE_LEN - 1;

/// Trie plus the state needed to finish its boundary windows
#[derive(Debug, Clone)]
pub struct BlockIndex {
    trie: ReadOnlyTrie,
    tail: Vec<u8>,
    follow: Vec<u8>,
    complete: bool,
    dirty: bool,
}

impl BlockIndex {
    /// Index `data`, with `follow` holding any bytes already known to come after it
    ///
    /// `last` marks the final block of a completed log.
    pub fn build(data: &[u8], follow: &[u8], last: bool) -> Self {
        let follow = &follow[..follow.len().min(LOOKAHEAD)];
        let trie = window_keys(data, follow).collect();
        let mut index = Self {
            trie,
            tail: Vec::new(),
            follow: follow.to_vec(),
            complete: last,
            dirty: false,
        };
        index.complete |= index.lookahead_satisfied(data.last().copied());
        if !index.complete {
            index.tail = data[data.len().saturating_sub(LOOKAHEAD)..].to_vec();
        }
        index
    }

    /// Wrap the trie of a block whose look-ahead is already final
    pub fn finished(trie: ReadOnlyTrie) -> Self {
        Self {
            trie,
            tail: Vec::new(),
            follow: Vec::new(),
            complete: true,
            dirty: false,
        }
    }

    /// Rehydrate a persisted block so its boundary windows can still be fixed up
    pub fn resume(trie: ReadOnlyTrie, data: &[u8], follow: &[u8]) -> Self {
        let mut index = Self {
            trie,
            tail: data[data.len().saturating_sub(LOOKAHEAD)..].to_vec(),
            follow: Vec::new(),
            complete: false,
            dirty: false,
        };
        if index.lookahead_satisfied(data.last().copied()) {
            index.tail.clear();
            index.complete = true;
        }
        index.observe(follow);
        index
    }

    fn lookahead_satisfied(&self, last_byte: Option<u8>) -> bool {
        last_byte == Some(b'\n') || self.follow.len() >= LOOKAHEAD || self.follow.contains(&b'\n')
    }

    /// Feed bytes appended to the log after this block
    pub fn observe(&mut self, bytes: &[u8]) {
        if self.complete || bytes.is_empty() {
            return;
        }
        let take = bytes.len().min(LOOKAHEAD - self.follow.len());
        self.follow.extend_from_slice(&bytes[..take]);
        self.dirty = true;
        if self.lookahead_satisfied(None) {
            self.complete = true;
        }
    }

    /// Mark the block as the last one of a completed log
    pub fn finish(&mut self) {
        self.complete = true;
    }

    /// Fold observed bytes into the trie; returns true if it was rebuilt
    pub fn refresh(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        let mut builder = ReadOnlyTrieBuilder::from_trie(&self.trie);
        builder.extend(window_keys(&self.tail, &self.follow));
        self.trie = builder.build();
        self.dirty = false;
        if self.complete {
            self.tail.clear();
        }
        true
    }

    /// True once the boundary windows can no longer change
    pub fn is_complete(&self) -> bool {
        self.complete && !self.dirty
    }

    /// The block's trie as of the last refresh
    pub fn trie(&self) -> &ReadOnlyTrie {
        &self.trie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::shingle::pack_window;

    #[test]
    fn test_newline_terminated_block_is_complete() {
        let index = BlockIndex::build(b"abc\n", b"", false);
        assert!(index.is_complete());
        assert_eq!(index.trie().len(), 4);
    }

    #[test]
    fn test_last_block_is_complete() {
        let index = BlockIndex::build(b"no newline", b"", true);
        assert!(index.is_complete());
    }

    #[test]
    fn test_observe_adds_straddling_window() {
        let mut index = BlockIndex::build(b"abcdefghijklm", b"", false);
        assert!(!index.is_complete());
        assert!(!index.trie().contains(pack_window(b"ijklmnop")));

        index.observe(b"nop");
        assert!(index.refresh());
        assert!(index.trie().contains(pack_window(b"ijklmnop")));
        // Still short of a full look-ahead
        assert!(!index.is_complete());

        index.observe(b"qrstuvwxyz");
        index.refresh();
        assert!(index.is_complete());
        assert!(index.trie().contains(pack_window(b"mnopqrst")));
        assert!(!index.refresh());
    }

    #[test]
    fn test_newline_in_follow_completes() {
        let mut index = BlockIndex::build(b"abcdefgh", b"", false);
        index.observe(b"i\n");
        index.refresh();
        assert!(index.is_complete());
        assert!(index.trie().contains(pack_window(b"ghi\n")));
    }

    #[test]
    fn test_resume_matches_fresh_build() {
        let data = b"0123456789";
        let partial = BlockIndex::build(data, b"ab", false);
        let mut resumed = BlockIndex::resume(partial.trie().clone(), data, b"abcdefg");
        resumed.refresh();

        let fresh = BlockIndex::build(data, b"abcdefg", false);
        for key in fresh.trie().iter() {
            assert!(resumed.trie().contains(key));
        }
        assert!(resumed.is_complete());
    }

    #[test]
    fn test_empty_block() {
        let index = BlockIndex::build(b"", b"", true);
        assert!(index.trie().is_empty());
    }
}
