//! Content hash for stored blobs
//!
//! A [`BlobHash`] is the full 32-byte BLAKE3 digest of a blob's bytes. It is
//! the only address the blob store understands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LogError;

/// A 32-byte BLAKE3 content hash
///
/// ## Example
///
/// ```rust
/// use chunklog_core::storage::BlobHash;
///
/// let hash = BlobHash::from_content(b"abc\n");
/// let parsed: BlobHash = hash.to_hex().parse().unwrap();
/// assert_eq!(hash, parsed);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlobHash([u8; 32]);

impl BlobHash {
    /// Size of the hash in bytes
    pub const SIZE: usize = 32;

    /// Wrap raw digest bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash content with BLAKE3
    #[inline]
    pub fn from_content(content: &[u8]) -> Self {
        Self(*blake3::hash(content).as_bytes())
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering (64 characters)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self, LogError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| LogError::deserialization(format!("invalid blob hash {s:?}: {e}")))?;
        Ok(Self(bytes))
    }

    /// True if `content` hashes to this value
    pub fn verify(&self, content: &[u8]) -> bool {
        Self::from_content(content) == *self
    }
}

impl fmt::Display for BlobHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlobHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobHash({})", &self.to_hex()[..12])
    }
}

impl FromStr for BlobHash {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let hash = BlobHash::from_content(b"abc");
        assert_eq!(
            hash.to_hex(),
            "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85"
        );
    }

    #[test]
    fn test_hex_round_trip() {
        let hash = BlobHash::from_content(b"hello");
        assert_eq!(BlobHash::from_hex(&hash.to_hex()).unwrap(), hash);
        assert_eq!(format!("{hash}").len(), 64);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(BlobHash::from_hex("zz").is_err());
        assert!(BlobHash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_verify() {
        let hash = BlobHash::from_content(b"payload");
        assert!(hash.verify(b"payload"));
        assert!(!hash.verify(b"payl0ad"));
    }
}
