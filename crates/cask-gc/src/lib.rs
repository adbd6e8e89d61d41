//! Garbage collection for the Cask chunk store.
//!
//! A mark-and-reconcile collector: refcounts are maintained incrementally by
//! the write path, and each pass independently confirms a chunk is both
//! unreferenced and unreachable before deleting it. Drift between the two
//! signals is reported, never auto-resolved by deletion.

pub mod collector;
pub mod error;

pub use collector::{GarbageCollector, GcReport};
pub use error::{GcError, GcResult};
