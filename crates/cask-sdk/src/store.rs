use std::sync::Arc;

use tracing::debug;

use cask_gc::{GarbageCollector, GcReport};
use cask_heads::HeadTable;
use cask_kv::{KvStore, MemoryKv};
use cask_store::{ChunkMeta, ChunkStore};
use cask_types::ChunkHash;

use crate::error::{SdkError, SdkResult};

/// Retry budget for the convenience head updates that absorb lost races on
/// behalf of the caller.
const HEAD_RETRY_LIMIT: usize = 64;

/// High-level Cask store API.
///
/// Bundles the chunk store, head table, and garbage collector over a single
/// injected key-value backend. The compare-and-set surface of [`HeadTable`]
/// is passed through unchanged for callers that reason about the old value;
/// [`force_set_head`] and [`retire_head`] wrap it in the documented
/// retry-with-fresh-reads loop for callers that do not.
///
/// [`force_set_head`]: Cask::force_set_head
/// [`retire_head`]: Cask::retire_head
pub struct Cask {
    chunks: ChunkStore,
    heads: HeadTable,
    gc: GarbageCollector,
}

impl Cask {
    /// Open a store over the given backend.
    pub fn open(kv: Arc<dyn KvStore>) -> Self {
        Self {
            chunks: ChunkStore::new(kv.clone()),
            heads: HeadTable::new(kv.clone()),
            gc: GarbageCollector::new(kv),
        }
    }

    /// Open a store over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryKv::new()))
    }

    // ---- Chunk operations ----

    /// Write a chunk referencing `refs` and return its content hash.
    pub fn put(&self, data: &[u8], refs: &[ChunkHash]) -> SdkResult<ChunkHash> {
        Ok(self.chunks.put(data, refs)?)
    }

    /// Read a chunk's payload.
    pub fn get(&self, hash: &ChunkHash) -> SdkResult<Vec<u8>> {
        Ok(self.chunks.get(hash)?)
    }

    /// Read a chunk's metadata.
    pub fn get_meta(&self, hash: &ChunkHash) -> SdkResult<ChunkMeta> {
        Ok(self.chunks.get_meta(hash)?)
    }

    /// Check whether a chunk exists.
    pub fn contains(&self, hash: &ChunkHash) -> SdkResult<bool> {
        Ok(self.chunks.contains(hash)?)
    }

    // ---- Head operations ----

    /// Compare-and-set a head. `Ok(false)` means the caller's expected value
    /// was stale; re-read and retry.
    pub fn set_head(
        &self,
        name: &str,
        new_hash: &ChunkHash,
        expected: Option<&ChunkHash>,
    ) -> SdkResult<bool> {
        Ok(self.heads.set(name, new_hash, expected)?)
    }

    /// Read the hash a head points at, or `None` if the head is absent.
    pub fn get_head(&self, name: &str) -> SdkResult<Option<ChunkHash>> {
        Ok(self.heads.get(name)?)
    }

    /// Compare-and-delete a head. `Ok(false)` on stale expected value.
    pub fn delete_head(&self, name: &str, expected: &ChunkHash) -> SdkResult<bool> {
        Ok(self.heads.delete(name, expected)?)
    }

    /// List all heads in ascending name order.
    pub fn heads(&self) -> SdkResult<Vec<(String, ChunkHash)>> {
        Ok(self.heads.list()?)
    }

    /// Point `name` at `new_hash` regardless of its current target.
    ///
    /// Lost compare-and-set races are retried with fresh reads until the
    /// update lands or the retry budget runs out.
    pub fn force_set_head(&self, name: &str, new_hash: &ChunkHash) -> SdkResult<()> {
        for attempt in 0..HEAD_RETRY_LIMIT {
            let current = self.heads.get(name)?;
            if self.heads.set(name, new_hash, current.as_ref())? {
                return Ok(());
            }
            debug!(head = name, attempt, "head update lost the race; retrying");
        }
        Err(SdkError::Contention(name.to_string()))
    }

    /// Remove a head whatever it currently points at.
    ///
    /// Returns `false` if the head does not exist. Lost races are retried
    /// with fresh reads.
    pub fn retire_head(&self, name: &str) -> SdkResult<bool> {
        for attempt in 0..HEAD_RETRY_LIMIT {
            let current = match self.heads.get(name)? {
                None => return Ok(false),
                Some(current) => current,
            };
            if self.heads.delete(name, &current)? {
                return Ok(true);
            }
            debug!(head = name, attempt, "head removal lost the race; retrying");
        }
        Err(SdkError::Contention(name.to_string()))
    }

    // ---- Collection ----

    /// Run one garbage-collection pass.
    pub fn collect(&self) -> SdkResult<GcReport> {
        Ok(self.gc.run()?)
    }

    /// Run collection passes until one deletes nothing, returning the total
    /// number of chunks reclaimed.
    ///
    /// Deleting a chunk releases its out-edges, which can make children
    /// eligible only on a later pass; the loop runs the cascade to
    /// completion.
    pub fn collect_to_fixpoint(&self) -> SdkResult<usize> {
        let mut total = 0;
        loop {
            let report = self.gc.run()?;
            if report.deleted == 0 {
                return Ok(total);
            }
            total += report.deleted;
        }
    }
}

impl std::fmt::Debug for Cask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cask").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_store::StoreError;

    // -----------------------------------------------------------------------
    // End-to-end lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn put_link_and_read_back() {
        let cask = Cask::in_memory();
        let leaf = cask.put(b"leaf payload", &[]).unwrap();
        let root = cask.put(b"root payload", &[leaf]).unwrap();
        cask.force_set_head("main", &root).unwrap();

        assert_eq!(cask.get(&root).unwrap(), b"root payload");
        assert_eq!(cask.get_meta(&root).unwrap().refs, vec![leaf]);
        assert_eq!(cask.get_head("main").unwrap(), Some(root));
        assert_eq!(cask.heads().unwrap(), vec![("main".to_string(), root)]);
    }

    #[test]
    fn identical_payloads_share_one_chunk() {
        let cask = Cask::in_memory();
        let h1 = cask.put(b"same bytes", &[]).unwrap();
        let h2 = cask.put(b"same bytes", &[]).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(cask.chunks.all_hashes().unwrap().len(), 1);
    }

    #[test]
    fn missing_chunk_surfaces_not_found() {
        let cask = Cask::in_memory();
        let err = cask.get(&ChunkHash::of(b"never written")).unwrap_err();
        assert!(matches!(err, SdkError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn set_head_passes_through_cas_discipline() {
        let cask = Cask::in_memory();
        let a = cask.put(b"a", &[]).unwrap();
        let b = cask.put(b"b", &[]).unwrap();
        assert!(cask.set_head("main", &a, None).unwrap());
        // Stale expected value loses.
        assert!(!cask.set_head("main", &b, None).unwrap());
        assert!(cask.set_head("main", &b, Some(&a)).unwrap());
        assert_eq!(cask.get_head("main").unwrap(), Some(b));
    }

    // -----------------------------------------------------------------------
    // Retrying head helpers
    // -----------------------------------------------------------------------

    #[test]
    fn force_set_head_creates_then_moves() {
        let cask = Cask::in_memory();
        let a = cask.put(b"a", &[]).unwrap();
        let b = cask.put(b"b", &[]).unwrap();
        cask.force_set_head("main", &a).unwrap();
        cask.force_set_head("main", &b).unwrap();
        assert_eq!(cask.get_head("main").unwrap(), Some(b));
        assert_eq!(cask.chunks.refcounter().get(&a).unwrap(), 0);
        assert_eq!(cask.chunks.refcounter().get(&b).unwrap(), 1);
    }

    #[test]
    fn retire_head_releases_the_target() {
        let cask = Cask::in_memory();
        let a = cask.put(b"a", &[]).unwrap();
        cask.force_set_head("main", &a).unwrap();
        assert!(cask.retire_head("main").unwrap());
        assert!(cask.get_head("main").unwrap().is_none());
        assert_eq!(cask.chunks.refcounter().get(&a).unwrap(), 0);
    }

    #[test]
    fn retire_absent_head_returns_false() {
        let cask = Cask::in_memory();
        assert!(!cask.retire_head("ghost").unwrap());
    }

    #[test]
    fn contended_head_updates_all_land() {
        use std::thread;

        let cask = Arc::new(Cask::in_memory());
        let a = cask.put(b"a", &[]).unwrap();
        let b = cask.put(b"b", &[]).unwrap();
        // Pin both targets so collection can never interfere with the swing.
        cask.force_set_head("pin-a", &a).unwrap();
        cask.force_set_head("pin-b", &b).unwrap();

        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|target| {
                let cask = Arc::clone(&cask);
                thread::spawn(move || {
                    for _ in 0..50 {
                        cask.force_set_head("swing", &target).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread should not panic");
        }

        let settled = cask.get_head("swing").unwrap().unwrap();
        assert!(settled == a || settled == b);
        // Two pins plus one swing reference, wherever the swing settled.
        let counts = cask.chunks.refcounter().get(&a).unwrap()
            + cask.chunks.refcounter().get(&b).unwrap();
        assert_eq!(counts, 3);
    }

    // -----------------------------------------------------------------------
    // Collection through the facade
    // -----------------------------------------------------------------------

    #[test]
    fn retiring_the_last_head_cascades_to_an_empty_store() {
        let cask = Cask::in_memory();
        let a = cask.put(b"chunk a", &[]).unwrap();
        let b = cask.put(b"chunk b", &[a]).unwrap();
        cask.force_set_head("main", &b).unwrap();

        cask.retire_head("main").unwrap();
        assert_eq!(cask.collect_to_fixpoint().unwrap(), 2);
        assert!(cask.chunks.all_hashes().unwrap().is_empty());
        assert!(cask.heads().unwrap().is_empty());
    }

    #[test]
    fn collect_deletes_nothing_on_a_clean_store() {
        let cask = Cask::in_memory();
        let root = cask.put(b"root", &[]).unwrap();
        cask.force_set_head("main", &root).unwrap();

        let first = cask.collect().unwrap();
        assert_eq!(first.deleted, 0);
        assert_eq!(first.reachable, 1);
        let second = cask.collect().unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn collection_runs_safely_under_head_traffic() {
        use std::thread;

        let cask = Arc::new(Cask::in_memory());
        let p1 = cask.put(b"pinned one", &[]).unwrap();
        let p2 = cask.put(b"pinned two", &[]).unwrap();
        cask.force_set_head("pin-1", &p1).unwrap();
        cask.force_set_head("pin-2", &p2).unwrap();

        let writer = {
            let cask = Arc::clone(&cask);
            thread::spawn(move || {
                for i in 0..100 {
                    let target = if i % 2 == 0 { p1 } else { p2 };
                    cask.force_set_head("swing", &target).unwrap();
                }
            })
        };
        let collector = {
            let cask = Arc::clone(&cask);
            thread::spawn(move || {
                for _ in 0..25 {
                    cask.collect().unwrap();
                }
            })
        };
        writer.join().expect("writer should not panic");
        collector.join().expect("collector should not panic");

        // Both chunks stayed pinned and were never collected.
        assert_eq!(cask.get(&p1).unwrap(), b"pinned one");
        assert_eq!(cask.get(&p2).unwrap(), b"pinned two");
        let settled = cask.get_head("swing").unwrap().unwrap();
        assert!(settled == p1 || settled == p2);
    }
}
