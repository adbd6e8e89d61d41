//! The physical key namespace of the store.
//!
//! Every logical address maps to a `/`-delimited string key:
//!
//! | Purpose | Pattern |
//! |---|---|
//! | chunk payload | `c/<hash>/d` |
//! | chunk metadata | `c/<hash>/m` |
//! | chunk refcount | `c/<hash>/r` |
//! | named head | `h/<name>` |
//!
//! Encoding is pure and total for typed inputs: a [`ChunkHash`] renders as
//! 64 hex digits, which can never contain the separator, and head names are
//! validated before a key is produced. The parse functions are the inverses
//! used by prefix scans to enumerate chunk hashes and head names.

use cask_types::{validate_head_name, AddressError, AddressResult, ChunkHash};

/// Prefix covering all chunk records (data, meta, refcount).
pub const CHUNK_PREFIX: &str = "c/";

/// Prefix covering all head records.
pub const HEAD_PREFIX: &str = "h/";

/// Which record family a chunk key addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkRecord {
    /// The chunk payload (`.../d`).
    Data,
    /// The chunk metadata (`.../m`).
    Meta,
    /// The chunk refcount (`.../r`).
    RefCount,
}

/// Key of a chunk's payload record.
pub fn chunk_data_key(hash: &ChunkHash) -> String {
    format!("{CHUNK_PREFIX}{hash}/d")
}

/// Key of a chunk's metadata record.
pub fn chunk_meta_key(hash: &ChunkHash) -> String {
    format!("{CHUNK_PREFIX}{hash}/m")
}

/// Key of a chunk's refcount record.
pub fn chunk_refcount_key(hash: &ChunkHash) -> String {
    format!("{CHUNK_PREFIX}{hash}/r")
}

/// Key of a named head. Fails on an empty or otherwise invalid name.
pub fn head_key(name: &str) -> AddressResult<String> {
    validate_head_name(name)?;
    Ok(format!("{HEAD_PREFIX}{name}"))
}

/// Parse a chunk-range key back into its hash and record family.
pub fn parse_chunk_key(key: &str) -> AddressResult<(ChunkHash, ChunkRecord)> {
    let rest = key
        .strip_prefix(CHUNK_PREFIX)
        .ok_or_else(|| AddressError::MalformedKey {
            key: key.to_string(),
            reason: format!("missing {CHUNK_PREFIX:?} prefix"),
        })?;
    let (hex, tag) = rest.rsplit_once('/').ok_or_else(|| AddressError::MalformedKey {
        key: key.to_string(),
        reason: "missing record tag".into(),
    })?;
    let record = match tag {
        "d" => ChunkRecord::Data,
        "m" => ChunkRecord::Meta,
        "r" => ChunkRecord::RefCount,
        other => {
            return Err(AddressError::MalformedKey {
                key: key.to_string(),
                reason: format!("unknown record tag: {other:?}"),
            })
        }
    };
    let hash = ChunkHash::from_hex(hex)?;
    Ok((hash, record))
}

/// Parse a head-range key back into the head name.
pub fn parse_head_key(key: &str) -> AddressResult<String> {
    let name = key
        .strip_prefix(HEAD_PREFIX)
        .ok_or_else(|| AddressError::MalformedKey {
            key: key.to_string(),
            reason: format!("missing {HEAD_PREFIX:?} prefix"),
        })?;
    validate_head_name(name)?;
    Ok(name.to_string())
}
