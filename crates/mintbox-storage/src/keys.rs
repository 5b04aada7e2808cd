//! Shared path handling for store backends.
//!
//! Paths are relative to the repository root, use `/` separators and must not contain
//! `..` segments or a leading `/`.

use crate::traits::{StoreError, StoreResult};

/// Reject paths that could escape the repository root.
pub fn validate_path(path: &str) -> StoreResult<()> {
    if path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Prefixes may be empty (repository root); surrounding slashes are dropped.
pub fn normalize_prefix(prefix: &str) -> StoreResult<&str> {
    let prefix = mintbox_core::paths::normalize_prefix(prefix);
    validate_path(prefix)?;
    Ok(prefix)
}

/// `/repos/{owner}/{repo}/contents/{path}` with every part encoded as one component.
pub fn contents_endpoint(owner: &str, repo: &str, path: &str) -> String {
    let mut endpoint = format!(
        "/repos/{}/{}/contents",
        urlencoding::encode(owner),
        urlencoding::encode(repo)
    );
    if !path.is_empty() {
        endpoint.push('/');
        endpoint.push_str(&urlencoding::encode(path));
    }
    endpoint
}
