use cask_types::{AddressError, ChunkHash};
use cask_kv::KvError;

/// Errors from chunk store and refcount operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Malformed chunk hash or head name (caller bug, not retried).
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The requested chunk was not found (deleted or never written).
    #[error("chunk not found: {0:?}")]
    NotFound(ChunkHash),

    /// A decrement would take the refcount below zero. This indicates a
    /// missing increment elsewhere and is never silently clamped.
    #[error("refcount underflow for {0:?}: decrement past zero")]
    RefUnderflow(ChunkHash),

    /// Defensive guard: delete was asked to remove a chunk that still has
    /// live references.
    #[error("chunk {hash:?} is still referenced (refcount {count})")]
    StillReferenced { hash: ChunkHash, count: u64 },

    /// An optimistic update lost the compare-and-swap race more times than
    /// the retry budget allows. Recoverable: the caller retries with a
    /// fresh read.
    #[error("compare-and-swap contention exhausted retries for key {key}")]
    CasConflict { key: String },

    /// A stored record is malformed and cannot be decoded.
    #[error("corrupt record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Error from the key-value backend.
    #[error(transparent)]
    Kv(#[from] KvError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
