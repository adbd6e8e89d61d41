use thiserror::Error;

/// Errors from key-value backend operations.
#[derive(Debug, Error)]
pub enum KvError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure (connection loss, internal fault).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for key-value operations.
pub type KvResult<T> = Result<T, KvError>;
