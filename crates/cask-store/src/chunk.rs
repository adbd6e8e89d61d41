//! Content-addressed chunk records.
//!
//! A chunk is two records in the backend: the opaque payload at
//! `c/<hash>/d` and a [`ChunkMeta`] at `c/<hash>/m`. Chunks are immutable
//! once written; the only mutations in this keyspace are create and delete.
//!
//! Writes follow a write-then-commit discipline: the meta record lands
//! first, then a compare-and-swap of the payload key from absent to the
//! payload commits the chunk. Exactly one of any number of concurrent
//! identical `put`s wins that swap, and only the winner performs the
//! out-edge refcount increments, so idempotent re-puts can never
//! double-count. A crash between the two writes leaves an orphan meta
//! record for the garbage collector to reclaim.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use cask_kv::KvStore;
use cask_types::ChunkHash;

use crate::error::{StoreError, StoreResult};
use crate::key::{chunk_data_key, chunk_meta_key, parse_chunk_key, CHUNK_PREFIX};
use crate::meta::ChunkMeta;
use crate::refcount::RefCounter;

/// Content-addressed chunk store over a shared key-value backend.
///
/// Owns the payload and metadata key ranges. Holds its own [`RefCounter`]
/// handle for link bookkeeping: `put` acquires a reference to every
/// out-edge target, `delete` releases them.
#[derive(Clone)]
pub struct ChunkStore {
    kv: Arc<dyn KvStore>,
    refs: RefCounter,
}

impl ChunkStore {
    /// Create a chunk store over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        let refs = RefCounter::new(kv.clone());
        Self { kv, refs }
    }

    /// The reference counter sharing this store's backend.
    pub fn refcounter(&self) -> &RefCounter {
        &self.refs
    }

    /// Write a chunk and return its content hash.
    ///
    /// `refs` names the chunks this payload references (its out-edges); the
    /// caller derives them from the payload, so identical payloads always
    /// carry identical refs. If a chunk with this hash already exists the
    /// call is an idempotent no-op.
    pub fn put(&self, data: &[u8], refs: &[ChunkHash]) -> StoreResult<ChunkHash> {
        let hash = ChunkHash::of(data);
        let data_key = chunk_data_key(&hash);

        if self.kv.get(&data_key)?.is_some() {
            debug!(chunk = %hash.short_hex(), "chunk already stored");
            return Ok(hash);
        }

        // Meta first; the first writer's record wins and is never replaced.
        let meta = ChunkMeta::new(refs.to_vec());
        self.kv
            .compare_and_swap(&chunk_meta_key(&hash), None, Some(&meta.to_bytes()?))?;

        // Payload CAS is the commit point.
        if !self.kv.compare_and_swap(&data_key, None, Some(data))? {
            // An identical concurrent put committed first; its increments
            // already cover the out-edges.
            debug!(chunk = %hash.short_hex(), "lost put race to identical chunk");
            return Ok(hash);
        }

        for target in refs {
            self.refs.increment(target)?;
        }

        debug!(
            chunk = %hash.short_hex(),
            bytes = data.len(),
            out_edges = refs.len(),
            "stored chunk"
        );
        Ok(hash)
    }

    /// Read a chunk's payload. Fails with [`StoreError::NotFound`] if no
    /// chunk exists at that hash (deleted or never written).
    ///
    /// The payload is re-hashed on the way out; a stored record that no
    /// longer matches its address is a corrupt record, not a chunk.
    pub fn get(&self, hash: &ChunkHash) -> StoreResult<Vec<u8>> {
        let key = chunk_data_key(hash);
        let data = self.kv.get(&key)?.ok_or(StoreError::NotFound(*hash))?;
        if !hash.matches(&data) {
            return Err(StoreError::CorruptRecord {
                key,
                reason: "payload does not match its content address".into(),
            });
        }
        Ok(data)
    }

    /// Read a chunk's metadata. Same existence contract as [`get`].
    ///
    /// [`get`]: ChunkStore::get
    pub fn get_meta(&self, hash: &ChunkHash) -> StoreResult<ChunkMeta> {
        let key = chunk_meta_key(hash);
        let raw = self.kv.get(&key)?.ok_or(StoreError::NotFound(*hash))?;
        ChunkMeta::from_bytes(&raw).map_err(|e| StoreError::CorruptRecord {
            key,
            reason: e.to_string(),
        })
    }

    /// Check whether a chunk exists.
    pub fn contains(&self, hash: &ChunkHash) -> StoreResult<bool> {
        Ok(self.kv.get(&chunk_data_key(hash))?.is_some())
    }

    /// Enumerate every chunk hash present in the store, sorted.
    ///
    /// Scans the whole `c/` range, so a hash is reported even when only
    /// part of its records survived a crash (orphan meta, stray refcount).
    pub fn all_hashes(&self) -> StoreResult<Vec<ChunkHash>> {
        let mut hashes = BTreeSet::new();
        for (key, _) in self.kv.scan_prefix(CHUNK_PREFIX)? {
            match parse_chunk_key(&key) {
                Ok((hash, _)) => {
                    hashes.insert(hash);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unparseable key in chunk range");
                }
            }
        }
        Ok(hashes.into_iter().collect())
    }

    /// Delete a chunk's payload and metadata records.
    ///
    /// Garbage-collector use only, after confirming the refcount is zero;
    /// this re-reads the count and fails with [`StoreError::StillReferenced`]
    /// if a concurrent writer re-linked the chunk. Releases one reference
    /// from every out-edge target of the deleted meta, mirroring `put`.
    /// Returns whether the payload record existed.
    pub fn delete(&self, hash: &ChunkHash) -> StoreResult<bool> {
        let count = self.refs.get(hash)?;
        if count > 0 {
            return Err(StoreError::StillReferenced { hash: *hash, count });
        }

        // Capture the out-edges before the records disappear.
        let meta = match self.get_meta(hash) {
            Ok(meta) => Some(meta),
            Err(StoreError::NotFound(_)) => None,
            Err(StoreError::CorruptRecord { key, reason }) => {
                warn!(key = %key, reason = %reason, "deleting chunk with undecodable meta; out-edges unknown");
                None
            }
            Err(e) => return Err(e),
        };

        let existed = self.kv.delete(&chunk_data_key(hash))?;
        self.kv.delete(&chunk_meta_key(hash))?;

        if let Some(meta) = meta {
            for target in &meta.refs {
                match self.refs.decrement(target) {
                    Ok(_) => {}
                    Err(StoreError::RefUnderflow(_)) => {
                        // Pre-existing drift: the target's count was already
                        // gone. Reported, not fatal to the deletion.
                        warn!(
                            chunk = %hash.short_hex(),
                            target = %target.short_hex(),
                            "refcount already zero while unlinking deleted chunk"
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        debug!(chunk = %hash.short_hex(), "deleted chunk");
        Ok(existed)
    }
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore").finish_non_exhaustive()
    }
}
