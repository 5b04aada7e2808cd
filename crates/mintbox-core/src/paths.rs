//! Remote path rules.
//!
//! An asset is two sibling files sharing one base name: `{prefix}/{stem}_{millis}.png`
//! and `{prefix}/{stem}_{millis}.json`. The image path is always derived from the
//! metadata path; no link between the two is ever stored.

use serde::Serialize;

use crate::constants::{FALLBACK_FILE_STEM, IMAGE_EXTENSION, METADATA_EXTENSION};

/// Replace every character outside `[A-Za-z0-9-]` with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitized file stem for a title; blank titles fall back to `My_NFT`.
pub fn file_stem(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        sanitize_title(trimmed)
    }
}

/// Image path paired with a metadata path: the trailing `.json` becomes `.png`.
///
/// Paths without the metadata extension get `.png` appended.
pub fn derive_image_path(metadata_path: &str) -> String {
    let base = metadata_path
        .strip_suffix(METADATA_EXTENSION)
        .unwrap_or(metadata_path);
    format!("{}{}", base, IMAGE_EXTENSION)
}

/// Metadata path paired with an image path.
pub fn derive_metadata_path(image_path: &str) -> String {
    let base = image_path
        .strip_suffix(IMAGE_EXTENSION)
        .unwrap_or(image_path);
    format!("{}{}", base, METADATA_EXTENSION)
}

/// Normalize a path prefix: surrounding slashes and whitespace are dropped.
pub fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim().trim_matches('/')
}

/// The two sibling paths written by one mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetPaths {
    pub image_path: String,
    pub metadata_path: String,
}

impl AssetPaths {
    pub fn new(prefix: &str, title: &str, timestamp_millis: i64) -> Self {
        let prefix = normalize_prefix(prefix);
        let base = format!("{}_{}", file_stem(title), timestamp_millis);
        let base = if prefix.is_empty() {
            base
        } else {
            format!("{}/{}", prefix, base)
        };

        Self {
            image_path: format!("{}{}", base, IMAGE_EXTENSION),
            metadata_path: format!("{}{}", base, METADATA_EXTENSION),
        }
    }
}

/// Publicly resolvable raw-content URL of a file on a branch.
///
/// The path is encoded as a single component, so `/` becomes `%2F`.
pub fn raw_content_url(
    raw_base: &str,
    owner: &str,
    repo: &str,
    branch: &str,
    path: &str,
) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        raw_base.trim_end_matches('/'),
        owner,
        repo,
        branch,
        urlencoding::encode(path)
    )
}
