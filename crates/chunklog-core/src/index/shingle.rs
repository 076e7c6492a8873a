//! Shingle keys
//!
//! A shingle is the 8-byte window starting at some position, ASCII-folded
//! to lowercase and packed big-endian into a `u64`. Windows that run past
//! the known data are padded with zero bytes. The packing is injective, so
//! a query of fewer than 8 bytes maps to a contiguous key range (its bytes
//! followed by every possible suffix) and can still be tested against a
//! block's trie without a full scan.

use crate::trie::ReadOnlyTrie;

/// Length of a shingle window in bytes
pub const SHINGLE_LEN: usize = 8;

/// Case folding applied to both indexed text and queries
#[inline]
pub fn fold(byte: u8) -> u8 {
    byte.to_ascii_lowercase()
}

/// Pack the first [`SHINGLE_LEN`] bytes of `window`, zero padded
pub fn pack_window(window: &[u8]) -> u64 {
    let mut key = 0u64;
    for index in 0..SHINGLE_LEN {
        let byte = window.get(index).map_or(0, |&b| fold(b));
        key = (key << 8) | u64::from(byte);
    }
    key
}

/// Keys for the windows starting at every position of `data`
///
/// Windows that extend past `data` continue into `follow` (at most
/// `SHINGLE_LEN - 1` bytes of it are used) and are then zero padded.
pub fn window_keys<'a>(data: &'a [u8], follow: &'a [u8]) -> impl Iterator<Item = u64> + 'a {
    let follow = &follow[..follow.len().min(SHINGLE_LEN - 1)];
    let padding = std::iter::repeat(0u8).take(SHINGLE_LEN - 1 - follow.len());
    let stream = data
        .iter()
        .chain(follow.iter())
        .copied()
        .chain(padding);

    stream
        .enumerate()
        .scan(0u64, |key, (index, byte)| {
            *key = (*key << 8) | u64::from(fold(byte));
            Some((index, *key))
        })
        .filter_map(|(index, key)| (index + 1 >= SHINGLE_LEN).then_some(key))
}

/// Membership test derived from a query string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShingleFilter {
    low: u64,
    high: u64,
}

impl ShingleFilter {
    /// Build the filter for `query`, or `None` for an empty query
    pub fn for_query(query: &[u8]) -> Option<Self> {
        if query.is_empty() {
            return None;
        }
        let used = query.len().min(SHINGLE_LEN);
        let low = pack_window(&query[..used]);
        let pad_bits = (SHINGLE_LEN - used) * 8;
        let high = if pad_bits == 0 {
            low
        } else {
            low | ((1u64 << pad_bits) - 1)
        };
        Some(Self { low, high })
    }

    /// True if the query is long enough for a single-key lookup
    pub fn is_exact(&self) -> bool {
        self.low == self.high
    }

    /// Inclusive key range the filter accepts
    pub fn range(&self) -> (u64, u64) {
        (self.low, self.high)
    }

    /// True if a block indexed by `trie` may contain a match
    pub fn may_match(&self, trie: &ReadOnlyTrie) -> bool {
        if self.is_exact() {
            trie.contains(self.low)
        } else {
            trie.contains_range(self.low, self.high)
        }
    }
}

/// Start offsets of every case-insensitive occurrence of `needle` in `haystack`
pub fn find_folded<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    let first = needle.first().map(|&b| fold(b));
    haystack
        .windows(needle.len().max(1))
        .enumerate()
        .filter(move |(_, window)| {
            !needle.is_empty() && Some(fold(window[0])) == first && window.eq_ignore_ascii_case(needle)
        })
        .map(|(offset, _)| offset)
}
