//! Atomic per-chunk reference counting.
//!
//! Every mutation is an optimistic read-modify-write loop over the backend's
//! per-key compare-and-swap: read the current record, compute the next value,
//! swap conditionally, retry on conflict with a fresh read. The count for an
//! absent record is zero, and a record that reaches zero is deleted, so "no
//! record" and "count zero" are the same observable state.
//!
//! Reaching zero never deletes the chunk itself; it only marks eligibility.
//! Deletion is the garbage collector's job, which keeps the hot write path
//! decoupled from reachability recomputation.

use std::sync::Arc;

use tracing::trace;

use cask_kv::KvStore;
use cask_types::ChunkHash;

use crate::error::{StoreError, StoreResult};
use crate::key::chunk_refcount_key;

/// Retry budget for compare-and-swap loops. Exhausting it surfaces a
/// recoverable conflict error rather than spinning forever.
const CAS_RETRY_LIMIT: usize = 64;

/// Per-chunk reference counter over a shared key-value backend.
#[derive(Clone)]
pub struct RefCounter {
    kv: Arc<dyn KvStore>,
}

impl RefCounter {
    /// Create a counter over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Current count for a chunk. Absent record reads as zero.
    pub fn get(&self, hash: &ChunkHash) -> StoreResult<u64> {
        let key = chunk_refcount_key(hash);
        match self.kv.get(&key)? {
            None => Ok(0),
            Some(raw) => decode_count(&key, &raw),
        }
    }

    /// Atomically add one reference, creating the record at 1 if absent.
    /// Returns the new count.
    pub fn increment(&self, hash: &ChunkHash) -> StoreResult<u64> {
        let key = chunk_refcount_key(hash);
        for _ in 0..CAS_RETRY_LIMIT {
            let current = self.kv.get(&key)?;
            let count = match &current {
                None => 0,
                Some(raw) => decode_count(&key, raw)?,
            };
            let next = count + 1;
            let encoded = encode_count(next)?;
            if self
                .kv
                .compare_and_swap(&key, current.as_deref(), Some(&encoded))?
            {
                trace!(chunk = %hash.short_hex(), count = next, "incremented refcount");
                return Ok(next);
            }
        }
        Err(StoreError::CasConflict { key })
    }

    /// Atomically remove one reference. Returns the new count.
    ///
    /// Decrementing an absent record or a stored zero fails with
    /// [`StoreError::RefUnderflow`]: it means a reference is being released
    /// that was never acquired, and must not be swallowed. A decrement that
    /// reaches zero deletes the record.
    pub fn decrement(&self, hash: &ChunkHash) -> StoreResult<u64> {
        let key = chunk_refcount_key(hash);
        for _ in 0..CAS_RETRY_LIMIT {
            let current = self.kv.get(&key)?;
            let count = match &current {
                None => return Err(StoreError::RefUnderflow(*hash)),
                Some(raw) => decode_count(&key, raw)?,
            };
            if count == 0 {
                return Err(StoreError::RefUnderflow(*hash));
            }
            let next = count - 1;
            let swapped = if next == 0 {
                self.kv.compare_and_swap(&key, current.as_deref(), None)?
            } else {
                let encoded = encode_count(next)?;
                self.kv
                    .compare_and_swap(&key, current.as_deref(), Some(&encoded))?
            };
            if swapped {
                trace!(chunk = %hash.short_hex(), count = next, "decremented refcount");
                return Ok(next);
            }
        }
        Err(StoreError::CasConflict { key })
    }

    /// Unconditionally remove the count record for a chunk.
    ///
    /// Garbage-collector cleanup for orphaned or drifted records; normal
    /// traffic never calls this.
    pub fn clear(&self, hash: &ChunkHash) -> StoreResult<()> {
        self.kv.delete(&chunk_refcount_key(hash))?;
        Ok(())
    }
}

impl std::fmt::Debug for RefCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefCounter").finish_non_exhaustive()
    }
}

fn encode_count(count: u64) -> StoreResult<Vec<u8>> {
    bincode::serialize(&count).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode_count(key: &str, raw: &[u8]) -> StoreResult<u64> {
    bincode::deserialize(raw).map_err(|e| StoreError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
