//! Asset models: the persisted metadata document and the records built from listings

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{IMAGE_EXTENSION, METADATA_EXTENSION};
use crate::paths::derive_image_path;

/// The JSON document stored next to every minted image.
///
/// Fields missing from a stored document read as empty strings, so one hand-edited or
/// truncated document does not hide the rest of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetMetadata {
    pub name: String,
    pub description: String,
    /// Raw-content URL of the paired image
    pub image: String,
    /// ISO-8601 creation timestamp
    pub created_at: String,
}

impl AssetMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: image.into(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Pretty-printed UTF-8 JSON, the exact bytes uploaded to the store.
    pub fn to_document(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// One minted asset as discovered by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub name: String,
    pub description: String,
    pub image: String,
    pub created_at: String,
    pub metadata_path: String,
    /// Store revision of the metadata document at listing time
    pub metadata_sha: String,
    /// Derived from `metadata_path`, never read from the store
    pub image_path: String,
}

impl AssetRecord {
    pub fn from_listing(
        metadata: AssetMetadata,
        metadata_path: impl Into<String>,
        metadata_sha: impl Into<String>,
    ) -> Self {
        let metadata_path = metadata_path.into();
        let image_path = derive_image_path(&metadata_path);
        Self {
            name: metadata.name,
            description: metadata.description,
            image: metadata.image,
            created_at: metadata.created_at,
            metadata_path,
            metadata_sha: metadata_sha.into(),
            image_path,
        }
    }
}

/// Path and revision of a file in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileHandle {
    pub path: String,
    pub sha: String,
    /// Commit that carried the write or delete, when the store reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

/// One element of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(rename = "type", default = "default_entry_kind")]
    pub kind: String,
}

fn default_entry_kind() -> String {
    "file".to_string()
}

impl DirectoryEntry {
    pub fn is_metadata(&self) -> bool {
        self.kind == "file" && self.name.ends_with(METADATA_EXTENSION)
    }

    pub fn is_image(&self) -> bool {
        self.kind == "file" && self.name.ends_with(IMAGE_EXTENSION)
    }
}
