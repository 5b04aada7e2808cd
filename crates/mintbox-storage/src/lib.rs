//! Mintbox Storage Library
//!
//! This crate provides the `AssetStore` abstraction over a path-addressed, revision
//! tracked remote file store, and its GitHub Contents API implementation.
//!
//! # Revision ids
//!
//! Every file carries an opaque `sha`. Overwriting or deleting a file requires the
//! caller to present the current `sha`; a stale one fails at the store. The store is
//! the only source of truth for revisions, so they are re-fetched whenever an operation
//! needs one that was not returned by the call that discovered the file.
//!
//! # Atomicity
//!
//! There is no multi-file transaction. Callers that write or delete two files order the
//! calls so that a failure in between leaves the least harmful orphan.

pub mod factory;
#[cfg(feature = "storage-github")]
pub mod github;
pub(crate) mod keys;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_store;
#[cfg(feature = "storage-github")]
pub use github::GitHubStore;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryStore, StoreCall, StoreOp};
pub use traits::{AssetStore, StoreError, StoreResult};
