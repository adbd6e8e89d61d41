//! The mark-and-reconcile garbage collector.
//!
//! Refcounts are maintained incrementally by the write path; the
//! collector's job is to catch drift and orphans left by crashes or lost
//! races, not to be the sole source of truth. A pass deletes a chunk only
//! when two independently conservative signals agree: its refcount is zero
//! *and* no head reaches it. Anything created or re-linked after the head
//! snapshot is simply excluded from this pass and reconsidered next run.
//!
//! The collector holds no locks, is idempotent, and is restartable at any
//! point: a crash mid-sweep leaves orphan records that a subsequent run
//! reclaims.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, warn};

use cask_heads::HeadTable;
use cask_kv::KvStore;
use cask_store::{ChunkStore, RefCounter, StoreError};
use cask_types::ChunkHash;

use crate::error::GcResult;

/// Summary of one collection pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Heads in the snapshot the pass marked from.
    pub heads: usize,
    /// Chunks reachable from those heads.
    pub reachable: usize,
    /// Chunk hashes enumerated in the store scan.
    pub scanned: usize,
    /// Chunks deleted by this pass.
    pub deleted: usize,
    /// Unreachable chunks retained because their refcount disagrees
    /// (refcount drift anomalies).
    pub drifted: usize,
}

/// Garbage collector over a shared key-value backend.
pub struct GarbageCollector {
    chunks: ChunkStore,
    heads: HeadTable,
    refs: RefCounter,
}

impl GarbageCollector {
    /// Create a collector over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            chunks: ChunkStore::new(kv.clone()),
            heads: HeadTable::new(kv.clone()),
            refs: RefCounter::new(kv),
        }
    }

    /// Execute one collection pass.
    ///
    /// 1. Snapshot all heads.
    /// 2. Mark every chunk reachable from the snapshot.
    /// 3. Enumerate all chunk hashes in the store.
    /// 4. Delete each unmarked chunk whose refcount is zero; retain and
    ///    report unmarked chunks whose refcount is positive (drift).
    pub fn run(&self) -> GcResult<GcReport> {
        let heads = self.heads.list()?;
        let reachable = self.mark(&heads)?;
        let scanned = self.chunks.all_hashes()?;

        let mut report = GcReport {
            heads: heads.len(),
            reachable: reachable.len(),
            scanned: scanned.len(),
            ..GcReport::default()
        };

        for hash in &scanned {
            if reachable.contains(hash) {
                continue;
            }
            let count = match self.refs.get(hash) {
                Ok(count) => count,
                Err(StoreError::CorruptRecord { key, reason }) => {
                    warn!(key = %key, reason = %reason, "unreadable refcount record; chunk retained");
                    report.drifted += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if count > 0 {
                // A missed decrement is the likelier explanation than a
                // missed mark; a live-looking count always wins over
                // unreachability.
                warn!(
                    chunk = %hash.short_hex(),
                    count,
                    "unreachable chunk with non-zero refcount; retained"
                );
                report.drifted += 1;
                continue;
            }
            match self.chunks.delete(hash) {
                Ok(_) => {
                    self.refs.clear(hash)?;
                    report.deleted += 1;
                }
                Err(StoreError::StillReferenced { count, .. }) => {
                    debug!(
                        chunk = %hash.short_hex(),
                        count,
                        "chunk re-linked during sweep; skipped"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            heads = report.heads,
            reachable = report.reachable,
            scanned = report.scanned,
            deleted = report.deleted,
            drifted = report.drifted,
            "collection pass complete"
        );
        Ok(report)
    }

    /// Breadth-first mark from the head snapshot through meta out-edges.
    ///
    /// The DAG is acyclic by construction (a chunk cannot reference its own
    /// not-yet-known hash), so the visited set exists purely to prune
    /// duplicate visits.
    fn mark(&self, heads: &[(String, ChunkHash)]) -> GcResult<HashSet<ChunkHash>> {
        let mut visited: HashSet<ChunkHash> = HashSet::new();
        let mut queue: VecDeque<ChunkHash> = VecDeque::new();

        for (name, hash) in heads {
            debug!(head = %name, target = %hash.short_hex(), "marking from head");
            if visited.insert(*hash) {
                queue.push_back(*hash);
            }
        }

        while let Some(current) = queue.pop_front() {
            let meta = match self.chunks.get_meta(&current) {
                Ok(meta) => meta,
                Err(StoreError::NotFound(_)) => {
                    warn!(chunk = %current.short_hex(), "reachable chunk has no meta record; dangling reference");
                    continue;
                }
                Err(StoreError::CorruptRecord { key, reason }) => {
                    warn!(key = %key, reason = %reason, "reachable chunk has undecodable meta; out-edges unknown");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            for target in &meta.refs {
                if visited.insert(*target) {
                    queue.push_back(*target);
                }
            }
        }

        Ok(visited)
    }
}

impl std::fmt::Debug for GarbageCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarbageCollector").finish_non_exhaustive()
    }
}
