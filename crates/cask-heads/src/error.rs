//! Error types for head operations.

use cask_kv::KvError;
use cask_types::AddressError;
use cask_store::StoreError;
use thiserror::Error;

/// Errors that can occur during head operations.
#[derive(Debug, Error)]
pub enum HeadError {
    /// The head name is malformed (caller bug, not retried).
    #[error("invalid head name: {0}")]
    InvalidName(#[from] AddressError),

    /// A stored head value could not be decoded as a chunk hash.
    #[error("corrupt head record at {key}: {reason}")]
    CorruptHead { key: String, reason: String },

    /// Error from refcount bookkeeping.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error from the key-value backend.
    #[error(transparent)]
    Kv(#[from] KvError),
}

/// Convenience alias for head operations.
pub type HeadResult<T> = Result<T, HeadError>;
