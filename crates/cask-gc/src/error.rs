//! Error types for garbage collection.

use cask_heads::HeadError;
use cask_store::StoreError;
use thiserror::Error;

/// Errors that can occur during a collection pass.
///
/// Per-chunk anomalies (refcount drift, dangling references, corrupt
/// records) never surface here; they are logged and the pass continues.
/// These variants are infrastructure failures that abort the run.
#[derive(Debug, Error)]
pub enum GcError {
    /// Error from chunk or refcount storage.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error from the head table.
    #[error(transparent)]
    Heads(#[from] HeadError),
}

/// Convenience alias for collection results.
pub type GcResult<T> = Result<T, GcError>;
