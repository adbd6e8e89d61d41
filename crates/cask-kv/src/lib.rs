//! Key-value backend contract for the Cask chunk store.
//!
//! The store treats its backend as a black box offering four primitives with
//! linearizable per-key semantics: exact-key get/put/delete, prefix-range
//! scan, and per-key compare-and-swap. There is no cross-key transaction;
//! every consistency guarantee above this layer comes from operation
//! ordering, not storage atomicity.
//!
//! # Backends
//!
//! All backends implement the [`KvStore`] trait:
//!
//! - [`MemoryKv`] -- `BTreeMap`-based store for tests and embedding

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{KvError, KvResult};
pub use memory::MemoryKv;
pub use traits::KvStore;
