//! Data models for the application
//!
//! Assets (metadata document + paired image) and the repository coordinates used to
//! reach the remote store.

mod asset;
mod repo;

pub use asset::*;
pub use repo::*;
