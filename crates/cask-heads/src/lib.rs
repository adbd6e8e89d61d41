//! Named mutable heads for the Cask chunk store.
//!
//! A head is a named pointer to a chunk hash, updated with optimistic
//! compare-and-set. Heads are the roots of reachability: a chunk is live if
//! some head reaches it. The table keeps the refcount invariant on every
//! pointer move by acquiring the incoming reference before releasing the
//! outgoing one.

pub mod error;
pub mod table;

pub use error::{HeadError, HeadResult};
pub use table::HeadTable;
