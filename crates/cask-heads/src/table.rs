//! The head table: named mutable pointers into the chunk DAG.
//!
//! Heads are the only externally mutable entry points into an otherwise
//! immutable store; all reachability is computed from the current set of
//! heads. Every update is a compare-and-set against the caller's last
//! observed value, and every pointer move keeps the refcount invariant by
//! acquiring the incoming reference *before* releasing the outgoing one.

use std::sync::Arc;

use tracing::{debug, warn};

use cask_kv::KvStore;
use cask_store::{head_key, parse_head_key, RefCounter, HEAD_PREFIX};
use cask_types::ChunkHash;

use crate::error::{HeadError, HeadResult};

/// Named mutable pointers over a shared key-value backend.
///
/// Owns the `h/` key range. Holds a [`RefCounter`] handle so pointer moves
/// and refcount bookkeeping stay in one place.
#[derive(Clone)]
pub struct HeadTable {
    kv: Arc<dyn KvStore>,
    refs: RefCounter,
}

impl HeadTable {
    /// Create a head table over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        let refs = RefCounter::new(kv.clone());
        Self { kv, refs }
    }

    /// Compare-and-set a head to `new_hash`.
    ///
    /// Succeeds only if the stored hash equals `expected` (`None` for
    /// first-time creation). Returns `Ok(false)` on mismatch; the caller
    /// re-reads and retries.
    ///
    /// Ordering is load-bearing: the new target's refcount is incremented
    /// before the pointer moves and before the old target's refcount is
    /// decremented. A concurrent garbage-collection pass can therefore never
    /// observe the new target both pointed-at and unreferenced. On a lost
    /// race the speculative increment is rolled back.
    pub fn set(
        &self,
        name: &str,
        new_hash: &ChunkHash,
        expected: Option<&ChunkHash>,
    ) -> HeadResult<bool> {
        let key = head_key(name)?;
        let new_value = encode_head(new_hash);
        let expected_value = expected.map(encode_head);

        self.refs.increment(new_hash)?;

        let swapped =
            self.kv
                .compare_and_swap(&key, expected_value.as_deref(), Some(&new_value))?;
        if !swapped {
            self.refs.decrement(new_hash)?;
            debug!(head = name, "head compare-and-set lost");
            return Ok(false);
        }

        if let Some(old) = expected {
            self.refs.decrement(old)?;
        }

        debug!(head = name, target = %new_hash.short_hex(), "head updated");
        Ok(true)
    }

    /// Read the hash a head points at, or `None` if the head is absent.
    pub fn get(&self, name: &str) -> HeadResult<Option<ChunkHash>> {
        let key = head_key(name)?;
        match self.kv.get(&key)? {
            None => Ok(None),
            Some(raw) => decode_head(&key, &raw).map(Some),
        }
    }

    /// Compare-and-delete a head.
    ///
    /// Succeeds only if the stored hash equals `expected`; on success the
    /// removed target's refcount is decremented. Returns `Ok(false)` on
    /// mismatch or if the head does not exist.
    pub fn delete(&self, name: &str, expected: &ChunkHash) -> HeadResult<bool> {
        let key = head_key(name)?;
        let expected_value = encode_head(expected);

        let swapped = self
            .kv
            .compare_and_swap(&key, Some(&expected_value), None)?;
        if !swapped {
            debug!(head = name, "head compare-and-delete lost");
            return Ok(false);
        }

        self.refs.decrement(expected)?;
        debug!(head = name, "head deleted");
        Ok(true)
    }

    /// List all heads as `(name, hash)` pairs in ascending name order.
    ///
    /// This is the read-consistent snapshot the garbage collector marks
    /// from.
    pub fn list(&self) -> HeadResult<Vec<(String, ChunkHash)>> {
        let mut heads = Vec::new();
        for (key, raw) in self.kv.scan_prefix(HEAD_PREFIX)? {
            let name = match parse_head_key(&key) {
                Ok(name) => name,
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unparseable key in head range");
                    continue;
                }
            };
            let hash = decode_head(&key, &raw)?;
            heads.push((name, hash));
        }
        Ok(heads)
    }
}

impl std::fmt::Debug for HeadTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadTable").finish_non_exhaustive()
    }
}

/// Head values are stored as the hex rendering of the target hash.
fn encode_head(hash: &ChunkHash) -> Vec<u8> {
    hash.to_hex().into_bytes()
}

fn decode_head(key: &str, raw: &[u8]) -> HeadResult<ChunkHash> {
    let text = std::str::from_utf8(raw).map_err(|e| HeadError::CorruptHead {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    ChunkHash::from_hex(text).map_err(|e| HeadError::CorruptHead {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
