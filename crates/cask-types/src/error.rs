use thiserror::Error;

/// Errors for malformed store addresses (chunk hashes and head names).
///
/// These indicate caller bugs: an invalid address is never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid hash length: expected {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid head name: {name}: {reason}")]
    InvalidHeadName { name: String, reason: String },

    #[error("malformed store key: {key}: {reason}")]
    MalformedKey { key: String, reason: String },
}

/// Convenience alias for address results.
pub type AddressResult<T> = Result<T, AddressError>;
