//! High-level SDK for the Cask chunk store.
//!
//! Provides a unified API over the three subsystems sharing one key-value
//! backend: content-addressed chunks, named heads, and the garbage
//! collector. This is the main entry point for applications embedding Cask.

pub mod error;
pub mod store;

pub use error::{SdkError, SdkResult};
pub use store::Cask;

// Re-export key types
pub use cask_gc::GcReport;
pub use cask_kv::{KvStore, MemoryKv};
pub use cask_store::ChunkMeta;
pub use cask_types::ChunkHash;
