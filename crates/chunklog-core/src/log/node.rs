//! Persisted index tree
//!
//! ```text
//! ref ──▶ LogNode ──▶ [PageRef] ──▶ LogIndexPage ──▶ [BlockSummary] ──▶ block bytes
//! ```
//!
//! Every node is an immutable blob addressed by its content hash. A node's
//! encoding is a four byte magic followed by a bincode envelope carrying the
//! format version.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};
use crate::storage::BlobHash;
use crate::trie::ReadOnlyTrie;

/// Current encoding version of all index nodes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Versioned<T> {
    version: u32,
    node: T,
}

/// A node type stored in the blob store
pub trait IndexNode: Serialize + DeserializeOwned {
    /// Leading bytes identifying the node type
    const MAGIC: [u8; 4];

    /// Serialize with magic and version envelope
    fn encode(&self) -> LogResult<Vec<u8>> {
        let envelope = Versioned {
            version: FORMAT_VERSION,
            node: self,
        };
        let body = bincode::serde::encode_to_vec(&envelope, bincode::config::standard())
            .map_err(LogError::serialization)?;

        let mut bytes = Vec::with_capacity(Self::MAGIC.len() + body.len());
        bytes.extend_from_slice(&Self::MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Parse bytes produced by [`IndexNode::encode`]
    fn decode(bytes: &[u8]) -> LogResult<Self> {
        let body = bytes.strip_prefix(&Self::MAGIC).ok_or_else(|| {
            LogError::deserialization(format!(
                "expected node magic {:?}",
                String::from_utf8_lossy(&Self::MAGIC)
            ))
        })?;
        let (envelope, _): (Versioned<Self>, usize) =
            bincode::serde::decode_from_slice(body, bincode::config::standard())
                .map_err(LogError::deserialization)?;
        if envelope.version != FORMAT_VERSION {
            return Err(LogError::deserialization(format!(
                "unsupported node version {}",
                envelope.version
            )));
        }
        Ok(envelope.node)
    }
}

/// Root of a log's index tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogNode {
    /// Total bytes of indexed data
    pub length: u64,
    /// Committed lines
    pub line_count: u64,
    /// Whether the log has been completed
    pub complete: bool,
    /// Data ends partway through a line
    pub partial_line: bool,
    /// Pages in log order
    pub pages: Vec<PageRef>,
}

impl IndexNode for LogNode {
    const MAGIC: [u8; 4] = *b"CLGR";
}

impl LogNode {
    /// Total number of blocks across all pages
    pub fn block_count(&self) -> u64 {
        self.pages.iter().map(|page| page.num_blocks as u64).sum()
    }

    /// Total newline bytes across all pages
    pub fn newlines(&self) -> u64 {
        self.pages.iter().map(|page| page.newlines).sum()
    }
}

/// Pointer from the root to one page of block summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    /// Hash of the encoded [`LogIndexPage`]
    pub hash: BlobHash,
    /// Byte offset of the page's first block
    pub offset: u64,
    /// Bytes covered by the page
    pub length: u64,
    /// Line number at which the page starts
    pub first_line: u64,
    /// Newline bytes in the page
    pub newlines: u64,
    /// Blocks in the page
    pub num_blocks: u32,
    /// Page will never be rewritten
    pub frozen: bool,
}

impl PageRef {
    /// One past the last line that starts in this page
    pub fn end_line(&self) -> u64 {
        self.first_line + self.newlines
    }
}

/// A run of consecutive block summaries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogIndexPage {
    /// Blocks in log order
    pub blocks: Vec<BlockSummary>,
}

impl IndexNode for LogIndexPage {
    const MAGIC: [u8; 4] = *b"CLGP";
}

/// Location and shingle trie of one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Hash of the raw block bytes
    pub data: BlobHash,
    /// Byte offset of the block within the log
    pub offset: u64,
    /// Block length in bytes
    pub length: u64,
    /// Line number of the block's first byte
    pub first_line: u64,
    /// Newline bytes in the block
    pub newlines: u64,
    /// Boundary windows are final
    pub lookahead_complete: bool,
    /// Shingle keys
    pub trie: ReadOnlyTrie,
}

impl BlockSummary {
    /// Byte offset one past the end of the block
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}
