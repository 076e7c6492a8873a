//! Builder for [`ReadOnlyTrie`]

use super::{NodeKind, ReadOnlyTrie, TrieNode, LEAF_SIZE};

/// Accumulates keys for a [`ReadOnlyTrie`]
///
/// Keys may arrive in any order and may repeat; `build` sorts and
/// deduplicates before constructing the trie.
#[derive(Debug, Clone, Default)]
pub struct ReadOnlyTrieBuilder {
    keys: Vec<u64>,
}

impl ReadOnlyTrieBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder seeded with the keys of an existing trie
    pub fn from_trie(trie: &ReadOnlyTrie) -> Self {
        Self {
            keys: trie.iter().collect(),
        }
    }

    /// Record a key
    pub fn add(&mut self, key: u64) {
        self.keys.push(key);
    }

    /// Number of keys recorded so far, duplicates included
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if nothing has been added
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Produce the immutable trie
    pub fn build(mut self) -> ReadOnlyTrie {
        self.keys.sort_unstable();
        self.keys.dedup();
        self.keys.shrink_to_fit();
        ReadOnlyTrie::from_sorted_unique(self.keys)
    }
}

impl Extend<u64> for ReadOnlyTrieBuilder {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        self.keys.extend(iter);
    }
}

/// Build the node arena for sorted, unique keys. Node 0 is the root.
pub(crate) fn build_nodes(keys: &[u64]) -> Vec<TrieNode> {
    let mut nodes = Vec::new();
    if !keys.is_empty() {
        build_range(keys, 0, keys.len(), &mut nodes);
    }
    nodes
}

fn build_range(keys: &[u64], start: usize, end: usize, nodes: &mut Vec<TrieNode>) -> u32 {
    let index = nodes.len();
    nodes.push(TrieNode {
        start: start as u32,
        end: end as u32,
        kind: NodeKind::Leaf,
    });

    if end - start > LEAF_SIZE {
        // Keys are unique, so the first and last of a range always differ
        let bit = 63 - (keys[start] ^ keys[end - 1]).leading_zeros();
        let mask = 1u64 << bit;
        let mid = start + keys[start..end].partition_point(|&k| k & mask == 0);

        let left = build_range(keys, start, mid, nodes);
        let right = build_range(keys, mid, end, nodes);
        nodes[index].kind = NodeKind::Branch {
            bit: bit as u8,
            left,
            right,
        };
    }

    index as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sorts_and_dedupes() {
        let mut builder = ReadOnlyTrieBuilder::new();
        builder.extend([9u64, 3, 3, 7, 1, 9]);
        assert_eq!(builder.len(), 6);

        let trie = builder.build();
        assert_eq!(trie.iter().collect::<Vec<_>>(), vec![1, 3, 7, 9]);
    }

    #[test]
    fn test_small_key_set_is_single_leaf() {
        let nodes = build_nodes(&[1, 2, 3]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::Leaf);
    }

    #[test]
    fn test_split_on_most_significant_differing_bit() {
        let keys: Vec<u64> = (0..16).collect();
        let nodes = build_nodes(&keys);
        match nodes[0].kind {
            NodeKind::Branch { bit, left, right } => {
                assert_eq!(bit, 3);
                assert_eq!(nodes[left as usize].end, 8);
                assert_eq!(nodes[right as usize].start, 8);
            }
            NodeKind::Leaf => panic!("expected a branch at the root"),
        }
    }

    #[test]
    fn test_from_trie_extends_existing_keys() {
        let trie: ReadOnlyTrie = [1u64, 2].into_iter().collect();
        let mut builder = ReadOnlyTrieBuilder::from_trie(&trie);
        builder.add(3);
        assert_eq!(builder.build().iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
