use crate::error::KvResult;

/// Key-value storage backend.
///
/// This is the sole external dependency of the chunk store. Implementations
/// must satisfy these invariants:
/// - All operations are linearizable per key. There are no cross-key
///   transactions; higher layers order their writes so that every
///   intermediate state is safe.
/// - `compare_and_swap` is atomic with respect to every other operation on
///   the same key.
/// - `scan_prefix` returns a point-in-time snapshot in ascending key order.
/// - Operations may block on I/O; callers must not hold results across
///   unrelated work.
/// - All I/O errors are propagated, never silently ignored.
pub trait KvStore: Send + Sync {
    /// Read the value at `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;

    /// Write `value` at `key`, overwriting any existing value.
    fn put(&self, key: &str, value: &[u8]) -> KvResult<()>;

    /// Delete the value at `key`. Returns `true` if the key existed.
    fn delete(&self, key: &str) -> KvResult<bool>;

    /// List all entries whose key starts with `prefix`, in ascending key
    /// order. Pass `""` to list everything.
    fn scan_prefix(&self, prefix: &str) -> KvResult<Vec<(String, Vec<u8>)>>;

    /// Atomically replace the value at `key` if it currently equals
    /// `expected`.
    ///
    /// `expected: None` means the key must be absent (conditional create);
    /// `new: None` deletes the key on success (conditional delete). Returns
    /// `true` if the swap was applied, `false` if the current value did not
    /// match. A `false` outcome is ordinary control flow: callers re-read
    /// and retry.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> KvResult<bool>;
}
