use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use crate::error::KvResult;
use crate::traits::KvStore;

/// In-memory, `BTreeMap`-based key-value store.
///
/// Intended for tests and embedding. All entries are held in memory behind an
/// `RwLock`; `compare_and_swap` takes the write lock, which makes it atomic
/// with respect to every other operation. The ordered map gives `scan_prefix`
/// ascending key order for free.
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKv {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> KvResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> KvResult<bool> {
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn scan_prefix(&self, prefix: &str) -> KvResult<Vec<(String, Vec<u8>)>> {
        let map = self.entries.read().expect("lock poisoned");
        let range = map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded));
        Ok(range
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> KvResult<bool> {
        let mut map = self.entries.write().expect("lock poisoned");
        let current = map.get(key).map(|v| v.as_slice());
        if current != expected {
            return Ok(false);
        }
        match new {
            Some(value) => {
                map.insert(key.to_string(), value.to_vec());
            }
            None => {
                map.remove(key);
            }
        }
        Ok(true)
    }
}

impl std::fmt::Debug for MemoryKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKv").field("key_count", &self.len()).finish()
    }
}
