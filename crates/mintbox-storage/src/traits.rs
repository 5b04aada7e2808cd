//! Store abstraction trait
//!
//! This module defines the `AssetStore` trait that the editor talks to.

use async_trait::async_trait;
use mintbox_core::{
    AssetMetadata, AssetRecord, DirectoryEntry, ErrorMetadata, LogLevel, RemoteFileHandle,
    RepoAccess,
};
use thiserror::Error;

/// Store operation errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Non-success HTTP status; `message` carries the remote's structured detail
    #[error("GitHub API error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// HTTP status of a remote failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// 409/422 responses: the presented revision is not the current one.
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409) | Some(422))
    }
}

impl ErrorMetadata for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            StoreError::Remote { .. } => "STORE_ERROR",
            StoreError::Transport(_) => "STORE_TRANSPORT_ERROR",
            StoreError::Decode(_) => "STORE_DECODE_ERROR",
            StoreError::InvalidPath(_) => "STORE_INVALID_PATH",
            StoreError::Config(_) => "STORE_CONFIG_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Remote { status, .. } => *status >= 500 || *status == 429,
            StoreError::Transport(_) => true,
            _ => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StoreError::Remote { status, .. } if *status < 500 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Path-addressed, revision-tracked remote file store.
///
/// Every operation takes the repository access it runs against; stores hold no
/// credentials of their own.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Create `path`, or overwrite it when `current_sha` names its current revision.
    ///
    /// `content_base64` is the base64 encoding of the file bytes.
    async fn put_file(
        &self,
        access: &RepoAccess,
        path: &str,
        content_base64: &str,
        message: Option<&str>,
        current_sha: Option<&str>,
    ) -> StoreResult<RemoteFileHandle>;

    /// Delete `path`. `sha` must be the file's current revision.
    async fn delete_file(
        &self,
        access: &RepoAccess,
        path: &str,
        sha: &str,
        message: Option<&str>,
    ) -> StoreResult<RemoteFileHandle>;

    /// Current revision id of `path`.
    async fn get_file_revision(&self, access: &RepoAccess, path: &str) -> StoreResult<String>;

    /// Direct children of `prefix`, in the store's listing order.
    async fn list_entries(
        &self,
        access: &RepoAccess,
        prefix: &str,
    ) -> StoreResult<Vec<DirectoryEntry>>;

    /// Read and parse the metadata document behind a listing entry.
    async fn fetch_metadata(
        &self,
        access: &RepoAccess,
        entry: &DirectoryEntry,
    ) -> StoreResult<AssetMetadata>;

    /// Every asset under `prefix`.
    ///
    /// Metadata bodies are fetched one at a time, in listing order, and the result keeps
    /// that order. A prefix without metadata documents yields an empty vec.
    async fn list_assets(
        &self,
        access: &RepoAccess,
        prefix: &str,
    ) -> StoreResult<Vec<AssetRecord>> {
        let entries = self.list_entries(access, prefix).await?;
        let total = entries.len();
        let metadata_entries: Vec<DirectoryEntry> =
            entries.into_iter().filter(|e| e.is_metadata()).collect();

        tracing::debug!(
            prefix = %prefix,
            entries = total,
            metadata_documents = metadata_entries.len(),
            "Listed store directory"
        );

        let mut records = Vec::with_capacity(metadata_entries.len());
        for entry in metadata_entries {
            let metadata = self.fetch_metadata(access, &entry).await?;
            records.push(AssetRecord::from_listing(metadata, entry.path, entry.sha));
        }

        Ok(records)
    }
}
