//! Block indexing
//!
//! Log bytes are cut into blocks; each block carries a [`ReadOnlyTrie`] of
//! its shingle keys so that a search can rule a block out without reading
//! it.
//!
//! [`ReadOnlyTrie`]: crate::trie::ReadOnlyTrie

mod block;
mod shingle;

pub use block::BlockIndex;
pub use shingle::{find_folded, fold, pack_window, window_keys, ShingleFilter, SHINGLE_LEN};
