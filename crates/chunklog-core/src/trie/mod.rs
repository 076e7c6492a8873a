//! Immutable trie over a set of `u64` keys
//!
//! The trie is built once from a static key set by recursively splitting on
//! the most significant bit in which the first and last key of a range
//! differ, stopping at short sorted leaf runs. Because the key set never
//! changes after [`ReadOnlyTrieBuilder::build`], no balancing is needed.
//!
//! ## Example
//!
//! ```rust
//! use chunklog_core::trie::ReadOnlyTrieBuilder;
//!
//! let mut builder = ReadOnlyTrieBuilder::new();
//! for key in [13u64, 1, 8, 2, 8] {
//!     builder.add(key);
//! }
//! let trie = builder.build();
//!
//! assert!(trie.contains(8));
//! assert_eq!(trie.enumerate_range(2, 10).collect::<Vec<_>>(), vec![2, 8]);
//! ```
//!
//! Only the sorted keys are persisted (delta encoded); the node arena is
//! rebuilt on load.

mod builder;

pub use builder::ReadOnlyTrieBuilder;

use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

/// Maximum number of keys held in a leaf run
pub(crate) const LEAF_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Leaf,
    Branch { bit: u8, left: u32, right: u32 },
}

/// A node covering `keys[start..end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrieNode {
    pub(crate) start: u32,
    pub(crate) end: u32,
    pub(crate) kind: NodeKind,
}

/// Immutable set of `u64` keys supporting membership and ordered range scans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TrieImage", into = "TrieImage")]
pub struct ReadOnlyTrie {
    keys: Vec<u64>,
    nodes: Vec<TrieNode>,
}

impl ReadOnlyTrie {
    /// An empty trie
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble from keys that are already sorted and unique.
    pub(crate) fn from_sorted_unique(keys: Vec<u64>) -> Self {
        let nodes = builder::build_nodes(&keys);
        Self { keys, nodes }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if no keys are stored
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Test whether `key` is stored, in O(depth)
    pub fn contains(&self, key: u64) -> bool {
        let Some(mut node) = self.nodes.first().copied() else {
            return false;
        };

        loop {
            let (low, high) = self.bounds(&node);
            if key < low || key > high {
                return false;
            }
            match node.kind {
                NodeKind::Branch { bit, left, right } => {
                    let next = if key & (1u64 << bit) == 0 { left } else { right };
                    node = self.nodes[next as usize];
                }
                NodeKind::Leaf => {
                    return self.keys[node.start as usize..node.end as usize]
                        .binary_search(&key)
                        .is_ok();
                }
            }
        }
    }

    /// Lazily enumerate stored keys in `[low, high]` (inclusive), ascending.
    ///
    /// Subtrees whose key range lies outside the bounds are never visited.
    /// Each call starts a fresh enumeration.
    pub fn enumerate_range(&self, low: u64, high: u64) -> RangeIter<'_> {
        let stack = if self.nodes.is_empty() || low > high {
            Vec::new()
        } else {
            vec![0]
        };
        RangeIter {
            trie: self,
            low,
            high,
            stack,
            cursor: 0,
            cursor_end: 0,
        }
    }

    /// True if any stored key lies in `[low, high]`
    pub fn contains_range(&self, low: u64, high: u64) -> bool {
        self.enumerate_range(low, high).next().is_some()
    }

    /// All keys in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.keys.iter().copied()
    }

    /// Depth of the deepest leaf (0 for empty or single-leaf tries)
    pub fn depth(&self) -> usize {
        fn walk(trie: &ReadOnlyTrie, index: u32) -> usize {
            match trie.nodes[index as usize].kind {
                NodeKind::Leaf => 0,
                NodeKind::Branch { left, right, .. } => 1 + walk(trie, left).max(walk(trie, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(self, 0)
        }
    }

    fn bounds(&self, node: &TrieNode) -> (u64, u64) {
        (
            self.keys[node.start as usize],
            self.keys[node.end as usize - 1],
        )
    }
}

impl FromIterator<u64> for ReadOnlyTrie {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut builder = ReadOnlyTrieBuilder::new();
        builder.extend(iter);
        builder.build()
    }
}

/// Iterator returned by [`ReadOnlyTrie::enumerate_range`]
#[derive(Debug, Clone)]
pub struct RangeIter<'a> {
    trie: &'a ReadOnlyTrie,
    low: u64,
    high: u64,
    stack: Vec<u32>,
    cursor: usize,
    cursor_end: usize,
}

impl Iterator for RangeIter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        loop {
            if self.cursor < self.cursor_end {
                let key = self.trie.keys[self.cursor];
                self.cursor += 1;
                if key > self.high {
                    // Everything after this key is larger still
                    self.cursor = self.cursor_end;
                    self.stack.clear();
                    return None;
                }
                return Some(key);
            }

            let index = self.stack.pop()?;
            let node = self.trie.nodes[index as usize];
            let (min, max) = self.trie.bounds(&node);
            if max < self.low || min > self.high {
                continue;
            }

            match node.kind {
                NodeKind::Leaf => {
                    let (start, end) = (node.start as usize, node.end as usize);
                    let skip = self.trie.keys[start..end].partition_point(|&k| k < self.low);
                    self.cursor = start + skip;
                    self.cursor_end = end;
                }
                NodeKind::Branch { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
    }
}

impl FusedIterator for RangeIter<'_> {}

/// Persisted form: ascending keys as deltas from their predecessor
#[derive(Serialize, Deserialize)]
struct TrieImage {
    deltas: Vec<u64>,
}

impl From<ReadOnlyTrie> for TrieImage {
    fn from(trie: ReadOnlyTrie) -> Self {
        let mut previous = 0u64;
        let deltas = trie
            .keys
            .into_iter()
            .map(|key| {
                let delta = key.wrapping_sub(previous);
                previous = key;
                delta
            })
            .collect();
        Self { deltas }
    }
}

impl From<TrieImage> for ReadOnlyTrie {
    fn from(image: TrieImage) -> Self {
        let mut previous = 0u64;
        // The builder re-sorts, so a damaged image still yields a valid trie
        image
            .deltas
            .into_iter()
            .map(|delta| {
                previous = previous.wrapping_add(delta);
                previous
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIBONACCI: [u64; 21] = [
        1,
        2,
        3,
        5,
        8,
        13,
        21,
        34,
        55,
        89,
        144,
        233,
        377,
        610,
        987,
        1597,
        2584,
        4181,
        6765,
        10946,
        0xfedc_ba98_7654_3210,
    ];

    fn fibonacci_trie() -> ReadOnlyTrie {
        let mut builder = ReadOnlyTrieBuilder::new();
        for value in FIBONACCI {
            builder.add(value);
        }
        builder.build()
    }

    #[test]
    fn test_enumerate_full_range() {
        let trie = fibonacci_trie();
        let all: Vec<u64> = trie.enumerate_range(0, u64::MAX).collect();
        assert_eq!(all, FIBONACCI.to_vec());
    }

    #[test]
    fn test_enumerate_partial_ranges() {
        let trie = fibonacci_trie();

        let upto_90: Vec<u64> = trie.enumerate_range(0, 90).collect();
        let expected: Vec<u64> = FIBONACCI.iter().copied().filter(|&x| x <= 90).collect();
        assert_eq!(upto_90, expected);

        let inner: Vec<u64> = trie.enumerate_range(2, 89).collect();
        let expected: Vec<u64> = FIBONACCI
            .iter()
            .copied()
            .filter(|&x| (2..=89).contains(&x))
            .collect();
        assert_eq!(inner, expected);
    }

    #[test]
    fn test_enumerate_is_restartable() {
        let trie = fibonacci_trie();
        let first: Vec<u64> = trie.enumerate_range(5, 1000).collect();
        let second: Vec<u64> = trie.enumerate_range(5, 1000).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_max_key_inclusive_upper_bound() {
        let trie: ReadOnlyTrie = [0u64, u64::MAX].into_iter().collect();
        assert!(trie.contains(u64::MAX));
        assert_eq!(
            trie.enumerate_range(u64::MAX, u64::MAX).collect::<Vec<_>>(),
            vec![u64::MAX]
        );
        assert_eq!(
            trie.enumerate_range(1, u64::MAX).collect::<Vec<_>>(),
            vec![u64::MAX]
        );
    }

    #[test]
    fn test_empty_trie() {
        let trie = ReadOnlyTrieBuilder::new().build();
        assert!(trie.is_empty());
        assert!(!trie.contains(0));
        assert!(!trie.contains(u64::MAX));
        assert_eq!(trie.enumerate_range(0, u64::MAX).count(), 0);
        assert_eq!(trie.depth(), 0);
    }

    #[test]
    fn test_single_and_duplicate_keys() {
        let trie: ReadOnlyTrie = [42u64, 42, 42].into_iter().collect();
        assert_eq!(trie.len(), 1);
        assert!(trie.contains(42));
        assert!(!trie.contains(41));
        assert_eq!(trie.enumerate_range(0, 100).collect::<Vec<_>>(), vec![42]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let trie = fibonacci_trie();
        assert_eq!(trie.enumerate_range(100, 10).count(), 0);
    }

    #[test]
    fn test_contains_matches_membership() {
        let trie = fibonacci_trie();
        for value in 0..11_000u64 {
            assert_eq!(trie.contains(value), FIBONACCI.contains(&value), "{value}");
        }
        assert!(trie.contains(0xfedc_ba98_7654_3210));
    }

    #[test]
    fn test_large_trie_branches() {
        let trie: ReadOnlyTrie = (0..10_000u64).map(|x| x * 7919).collect();
        assert!(trie.depth() > 0);
        assert!(trie.contains(7919 * 5000));
        assert!(!trie.contains(7919 * 5000 + 1));
        let window: Vec<u64> = trie.enumerate_range(7919 * 10, 7919 * 12).collect();
        assert_eq!(window, vec![7919 * 10, 7919 * 11, 7919 * 12]);
    }

    #[test]
    fn test_serde_round_trip_preserves_keys() {
        let trie = fibonacci_trie();
        let config = bincode::config::standard();
        let bytes = bincode::serde::encode_to_vec(&trie, config).unwrap();
        let (decoded, _): (ReadOnlyTrie, usize) =
            bincode::serde::decode_from_slice(&bytes, config).unwrap();
        assert_eq!(decoded, trie);
        assert!(decoded.contains(10946));
    }
}
