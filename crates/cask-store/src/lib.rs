//! Chunk storage for the Cask content-addressable DAG store.
//!
//! Every chunk owns three records in the shared key-value backend, laid out
//! under a common prefix by the [`key`] codec:
//!
//! - `c/<hash>/d` -- the opaque payload ([`ChunkStore`])
//! - `c/<hash>/m` -- the [`ChunkMeta`] record with the chunk's out-edges
//! - `c/<hash>/r` -- the reference count ([`RefCounter`])
//!
//! # Design Rules
//!
//! 1. Chunks are immutable once written; the hash is the BLAKE3 digest of
//!    the payload, so identical content is deduplicated for free.
//! 2. Write-then-commit: meta lands first, the payload compare-and-swap
//!    commits, and only the committing writer acquires out-edge references.
//! 3. Refcount mutations are per-key atomic read-modify-write loops;
//!    decrement past zero fails loudly.
//! 4. A zero refcount marks eligibility for collection; deletion itself is
//!    reserved for the garbage collector.
//! 5. All backend errors are propagated, never silently ignored.

pub mod chunk;
pub mod error;
pub mod key;
pub mod meta;
pub mod refcount;

pub use chunk::ChunkStore;
pub use error::{StoreError, StoreResult};
pub use key::{
    chunk_data_key, chunk_meta_key, chunk_refcount_key, head_key, parse_chunk_key,
    parse_head_key, ChunkRecord, CHUNK_PREFIX, HEAD_PREFIX,
};
pub use meta::ChunkMeta;
pub use refcount::RefCounter;
