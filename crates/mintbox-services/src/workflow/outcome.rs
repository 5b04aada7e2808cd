//! Workflow results.
//!
//! Mint and remove each write two files without a transaction. Their error types name
//! the window between the two calls so that a caller can see exactly which file was
//! left behind.

use mintbox_core::{
    AssetMetadata, AssetPaths, DirectoryEntry, ErrorMetadata, LogLevel, RemoteFileHandle,
    ValidationError,
};
use mintbox_processing::RenderError;
use mintbox_storage::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Result of triggering a workflow.
#[must_use]
#[derive(Debug)]
pub enum Dispatch<T> {
    Ran(T),
    /// The same workflow kind was already running; nothing was done.
    AlreadyRunning,
}

impl<T> Dispatch<T> {
    pub fn ran(self) -> Option<T> {
        match self {
            Dispatch::Ran(value) => Some(value),
            Dispatch::AlreadyRunning => None,
        }
    }

    pub fn is_already_running(&self) -> bool {
        matches!(self, Dispatch::AlreadyRunning)
    }
}

/// Both files of a completed mint.
#[derive(Debug, Clone, Serialize)]
pub struct MintReport {
    pub paths: AssetPaths,
    pub image: RemoteFileHandle,
    pub metadata: RemoteFileHandle,
    /// Raw-content URL recorded in the metadata document
    pub image_url: String,
    pub document: AssetMetadata,
}

#[derive(Debug, Error)]
pub enum MintError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// Nothing was written.
    #[error(transparent)]
    ImageUpload(StoreError),

    #[error("Failed to encode metadata: {0}")]
    MetadataEncode(String),

    /// The image exists remotely without its metadata document.
    #[error("{source}")]
    MetadataUpload {
        orphaned_image: RemoteFileHandle,
        #[source]
        source: StoreError,
    },
}

impl MintError {
    /// Remote file left behind by this failure, if any.
    pub fn orphaned_image(&self) -> Option<&RemoteFileHandle> {
        match self {
            MintError::MetadataUpload { orphaned_image, .. } => Some(orphaned_image),
            _ => None,
        }
    }
}

impl ErrorMetadata for MintError {
    fn error_code(&self) -> &'static str {
        match self {
            MintError::Validation(e) => e.error_code(),
            MintError::Render(e) => e.error_code(),
            MintError::ImageUpload(_) => "IMAGE_UPLOAD_FAILED",
            MintError::MetadataEncode(_) => "METADATA_ENCODE_FAILED",
            MintError::MetadataUpload { .. } => "PARTIAL_MINT",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            MintError::Validation(e) => e.is_recoverable(),
            MintError::Render(e) => e.is_recoverable(),
            MintError::ImageUpload(e) | MintError::MetadataUpload { source: e, .. } => {
                e.is_recoverable()
            }
            MintError::MetadataEncode(_) => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            MintError::Validation(e) => e.log_level(),
            MintError::Render(e) => e.log_level(),
            MintError::ImageUpload(e) => e.log_level(),
            MintError::MetadataEncode(_) | MintError::MetadataUpload { .. } => LogLevel::Error,
        }
    }

    fn writes_activity_log(&self) -> bool {
        match self {
            MintError::Validation(e) => e.writes_activity_log(),
            MintError::Render(e) => e.writes_activity_log(),
            _ => true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorMetadata for ListError {
    fn error_code(&self) -> &'static str {
        match self {
            ListError::Validation(e) => e.error_code(),
            ListError::Store(e) => e.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            ListError::Validation(e) => e.is_recoverable(),
            ListError::Store(e) => e.is_recoverable(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ListError::Validation(e) => e.log_level(),
            ListError::Store(e) => e.log_level(),
        }
    }

    fn writes_activity_log(&self) -> bool {
        match self {
            ListError::Validation(e) => e.writes_activity_log(),
            ListError::Store(e) => e.writes_activity_log(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoveOutcome {
    /// Confirmation was refused; nothing was touched.
    Declined,
    Removed {
        metadata: RemoteFileHandle,
        image: RemoteFileHandle,
    },
}

#[derive(Debug, Error)]
pub enum RemoveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The image revision could not be read; nothing was deleted.
    #[error(transparent)]
    Revision(StoreError),

    /// Nothing was deleted.
    #[error(transparent)]
    MetadataDelete(StoreError),

    /// The metadata document is gone but the image remains.
    #[error("{source}")]
    ImageDelete {
        deleted_metadata: RemoteFileHandle,
        #[source]
        source: StoreError,
    },
}

impl RemoveError {
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            RemoveError::Validation(_) => None,
            RemoveError::Revision(e)
            | RemoveError::MetadataDelete(e)
            | RemoveError::ImageDelete { source: e, .. } => Some(e),
        }
    }
}

impl ErrorMetadata for RemoveError {
    fn error_code(&self) -> &'static str {
        match self {
            RemoveError::Validation(e) => e.error_code(),
            RemoveError::Revision(_) => "IMAGE_REVISION_FAILED",
            RemoveError::MetadataDelete(_) => "METADATA_DELETE_FAILED",
            RemoveError::ImageDelete { .. } => "PARTIAL_REMOVE",
        }
    }

    fn is_recoverable(&self) -> bool {
        self.store_error().is_some_and(|e| e.is_recoverable())
    }

    fn log_level(&self) -> LogLevel {
        match self {
            RemoveError::Validation(e) => e.log_level(),
            RemoveError::ImageDelete { .. } => LogLevel::Error,
            RemoveError::Revision(e) | RemoveError::MetadataDelete(e) => e.log_level(),
        }
    }

    fn writes_activity_log(&self) -> bool {
        !matches!(self, RemoveError::Validation(_))
    }
}

/// Files under the prefix whose sibling is missing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrphanReport {
    /// `.png` files without a `.json` sibling (partial mint or partial remove)
    pub images_without_metadata: Vec<DirectoryEntry>,
    /// `.json` files without a `.png` sibling
    pub metadata_without_image: Vec<DirectoryEntry>,
}

impl OrphanReport {
    pub fn is_empty(&self) -> bool {
        self.images_without_metadata.is_empty() && self.metadata_without_image.is_empty()
    }

    pub fn total(&self) -> usize {
        self.images_without_metadata.len() + self.metadata_without_image.len()
    }
}

#[derive(Debug, Error)]
pub enum OrphanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorMetadata for OrphanError {
    fn error_code(&self) -> &'static str {
        match self {
            OrphanError::Validation(e) => e.error_code(),
            OrphanError::Store(e) => e.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, OrphanError::Store(e) if e.is_recoverable())
    }

    fn log_level(&self) -> LogLevel {
        match self {
            OrphanError::Validation(e) => e.log_level(),
            OrphanError::Store(e) => e.log_level(),
        }
    }

    fn writes_activity_log(&self) -> bool {
        matches!(self, OrphanError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(path: &str) -> RemoteFileHandle {
        RemoteFileHandle {
            path: path.to_string(),
            sha: "s".to_string(),
            commit_sha: None,
        }
    }

    fn remote(status: u16) -> StoreError {
        StoreError::Remote {
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn partial_mint_names_the_orphaned_image() {
        let err = MintError::MetadataUpload {
            orphaned_image: handle("nfts/a.png"),
            source: remote(500),
        };
        assert_eq!(err.orphaned_image().unwrap().path, "nfts/a.png");
        assert_eq!(err.error_code(), "PARTIAL_MINT");
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "GitHub API error 500: boom");
    }

    #[test]
    fn validation_failures_stay_out_of_the_activity_log() {
        let err = MintError::from(ValidationError::MissingFields(vec!["owner"]));
        assert!(!err.writes_activity_log());
        let err = RemoveError::from(ValidationError::MissingFields(vec!["token"]));
        assert!(!err.writes_activity_log());
        assert!(err.store_error().is_none());
    }

    #[test]
    fn render_failures_are_silent() {
        let err = MintError::from(RenderError::SurfaceUnavailable {
            width: 0,
            height: 0,
        });
        assert!(!err.writes_activity_log());
    }

    #[test]
    fn dispatch_unwraps_ran_values() {
        assert_eq!(Dispatch::Ran(3).ran(), Some(3));
        assert!(Dispatch::<u8>::AlreadyRunning.is_already_running());
    }
}
