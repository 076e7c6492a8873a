//! Content-addressed blob storage
//!
//! ## Key Components
//!
//! - [`BlobStore`]: read-by-hash plus atomic ref compare-and-swap
//! - [`BlobWriter`]: hashes payloads as they are queued, persists on flush
//! - [`MemoryBlobStore`] / [`FileBlobStore`]: the two backends
//!
//! Blobs are immutable. The only mutable state is the ref per log, and it
//! only ever moves by compare-and-swap, so a reader that resolved a ref once
//! sees a consistent tree for the rest of its operation.

mod file;
mod hash;
mod memory;
mod traits;

pub(crate) use file::write_atomic;
pub use file::FileBlobStore;
pub use hash::BlobHash;
pub use memory::MemoryBlobStore;
pub use traits::{validate_ref_name, BlobStore, BlobWriter, CasResult};
