//! Foundation types for the Cask chunk store.
//!
//! Defines the content-addressed [`ChunkHash`], head name validation for
//! the key namespace, and the [`AddressError`] taxonomy shared by every
//! layer of the store.

pub mod error;
pub mod hash;
pub mod names;

pub use error::{AddressError, AddressResult};
pub use hash::ChunkHash;
pub use names::validate_head_name;
