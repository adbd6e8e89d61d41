use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use cask_types::ChunkHash;

use crate::error::{StoreError, StoreResult};

/// Metadata record stored beside a chunk's payload.
///
/// Carries the chunk's out-edges in the DAG and its creation time. Meta
/// records are written exactly once, under the chunk's content hash, and are
/// never updated in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Creation time, unix epoch milliseconds.
    pub created_at_ms: u64,
    /// Hashes of the chunks this chunk directly references.
    pub refs: Vec<ChunkHash>,
}

impl ChunkMeta {
    /// Create a meta record stamped with the current time.
    pub fn new(refs: Vec<ChunkHash>) -> Self {
        let created_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            created_at_ms,
            refs,
        }
    }

    /// Create a meta record with an explicit timestamp.
    pub fn with_timestamp(created_at_ms: u64, refs: Vec<ChunkHash>) -> Self {
        Self {
            created_at_ms,
            refs,
        }
    }

    /// Returns `true` if this chunk references no other chunks.
    pub fn is_leaf(&self) -> bool {
        self.refs.is_empty()
    }

    /// Serialize to bincode bytes.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Deserialize from bincode bytes.
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
