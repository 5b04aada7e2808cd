//! In-memory `AssetStore` for tests.
//!
//! Behaves like the remote store where callers can observe it: revision ids change on
//! every write, stale revisions are refused, missing paths are 404s and an existing file
//! is never overwritten without its current revision. Every call is recorded, failures
//! can be injected per operation, and uploads can be held behind a semaphore.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64::Engine;
use mintbox_core::{AssetMetadata, DirectoryEntry, RemoteFileHandle, RepoAccess};
use tokio::sync::Semaphore;

use crate::keys::{normalize_prefix, validate_path};
use crate::traits::{AssetStore, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Put,
    Delete,
    GetRevision,
    ListEntries,
    FetchMetadata,
}

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub path: String,
    /// Revision presented by the caller (delete, overwrite)
    pub sha: Option<String>,
}

struct StoredFile {
    content: Vec<u8>,
    sha: String,
}

#[derive(Default)]
struct MemoryState {
    files: BTreeMap<String, StoredFile>,
    calls: Vec<StoreCall>,
    /// Injected failures per operation, optionally bound to one path
    failures: HashMap<StoreOp, VecDeque<(Option<String>, StoreError)>>,
    next_revision: u64,
}

impl MemoryState {
    fn next_sha(&mut self) -> String {
        self.next_revision += 1;
        format!("{:040x}", self.next_revision)
    }

    fn record(&mut self, op: StoreOp, path: &str, sha: Option<&str>) -> StoreResult<()> {
        self.calls.push(StoreCall {
            op,
            path: path.to_string(),
            sha: sha.map(String::from),
        });
        let Some(queue) = self.failures.get_mut(&op) else {
            return Ok(());
        };
        let position = queue
            .iter()
            .position(|(target, _)| target.as_deref().map_or(true, |t| t == path));
        match position.and_then(|i| queue.remove(i)) {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found() -> StoreError {
    StoreError::Remote {
        status: 404,
        message: "Not Found".to_string(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    put_gate: Option<Arc<Semaphore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `put_file` waits for a permit of `gate` before doing anything.
    pub fn with_put_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.put_gate = Some(gate);
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a file without recording a call. Returns its revision.
    pub fn insert_file(&self, path: &str, content: impl Into<Vec<u8>>) -> String {
        let mut state = self.state();
        let sha = state.next_sha();
        state.files.insert(
            path.to_string(),
            StoredFile {
                content: content.into(),
                sha: sha.clone(),
            },
        );
        sha
    }

    /// Seed a metadata document, and its image when `with_image` is set.
    /// Returns the metadata revision.
    pub fn insert_asset(
        &self,
        metadata_path: &str,
        metadata: &AssetMetadata,
        with_image: bool,
    ) -> String {
        let document = serde_json::to_vec_pretty(metadata).unwrap_or_default();
        if with_image {
            let image_path = mintbox_core::derive_image_path(metadata_path);
            self.insert_file(&image_path, b"\x89PNG\r\n\x1a\n".to_vec());
        }
        self.insert_file(metadata_path, document)
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path).map(|f| f.content.clone())
    }

    pub fn sha_of(&self, path: &str) -> Option<String> {
        self.state().files.get(path).map(|f| f.sha.clone())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state().files.contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn calls_of(&self, op: StoreOp) -> Vec<StoreCall> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make the next call of `op` fail with `error` (after it is recorded).
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.state()
            .failures
            .entry(op)
            .or_default()
            .push_back((None, error));
    }

    /// Make the next call of `op` on `path` fail with `error`.
    pub fn fail_next_at(&self, op: StoreOp, path: &str, error: StoreError) {
        self.state()
            .failures
            .entry(op)
            .or_default()
            .push_back((Some(path.to_string()), error));
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn put_file(
        &self,
        _access: &RepoAccess,
        path: &str,
        content_base64: &str,
        _message: Option<&str>,
        current_sha: Option<&str>,
    ) -> StoreResult<RemoteFileHandle> {
        if let Some(gate) = &self.put_gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| StoreError::Transport(e.to_string()))?;
        }

        validate_path(path)?;
        let mut state = self.state();
        state.record(StoreOp::Put, path, current_sha)?;

        let content = base64::engine::general_purpose::STANDARD
            .decode(content_base64)
            .map_err(|_| StoreError::Remote {
                status: 422,
                message: "content is not valid Base64".to_string(),
            })?;

        match (state.files.get(path), current_sha) {
            (Some(_), None) => {
                return Err(StoreError::Remote {
                    status: 422,
                    message: "Invalid request.\n\n\"sha\" wasn't supplied.".to_string(),
                })
            }
            (Some(existing), Some(sha)) if existing.sha != sha => {
                return Err(StoreError::Remote {
                    status: 409,
                    message: format!("{} does not match {}", path, sha),
                })
            }
            (None, Some(_)) => return Err(not_found()),
            _ => {}
        }

        let sha = state.next_sha();
        let commit_sha = state.next_sha();
        state.files.insert(
            path.to_string(),
            StoredFile {
                content,
                sha: sha.clone(),
            },
        );

        Ok(RemoteFileHandle {
            path: path.to_string(),
            sha,
            commit_sha: Some(commit_sha),
        })
    }

    async fn delete_file(
        &self,
        _access: &RepoAccess,
        path: &str,
        sha: &str,
        _message: Option<&str>,
    ) -> StoreResult<RemoteFileHandle> {
        validate_path(path)?;
        let mut state = self.state();
        state.record(StoreOp::Delete, path, Some(sha))?;

        match state.files.get(path) {
            None => return Err(not_found()),
            Some(existing) if existing.sha != sha => {
                return Err(StoreError::Remote {
                    status: 409,
                    message: format!("{} does not match {}", path, sha),
                })
            }
            Some(_) => {}
        }

        state.files.remove(path);
        let commit_sha = state.next_sha();

        Ok(RemoteFileHandle {
            path: path.to_string(),
            sha: sha.to_string(),
            commit_sha: Some(commit_sha),
        })
    }

    async fn get_file_revision(&self, _access: &RepoAccess, path: &str) -> StoreResult<String> {
        validate_path(path)?;
        let mut state = self.state();
        state.record(StoreOp::GetRevision, path, None)?;
        state
            .files
            .get(path)
            .map(|f| f.sha.clone())
            .ok_or_else(not_found)
    }

    async fn list_entries(
        &self,
        _access: &RepoAccess,
        prefix: &str,
    ) -> StoreResult<Vec<DirectoryEntry>> {
        let prefix = normalize_prefix(prefix)?;
        let mut state = self.state();
        state.record(StoreOp::ListEntries, prefix, None)?;

        let mut entries: Vec<DirectoryEntry> = Vec::new();
        for (path, file) in &state.files {
            let rest = if prefix.is_empty() {
                path.as_str()
            } else {
                match path
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('/'))
                {
                    Some(rest) => rest,
                    None => continue,
                }
            };

            match rest.split_once('/') {
                Some((dir, _)) => {
                    if entries.iter().any(|e| e.kind == "dir" && e.name == dir) {
                        continue;
                    }
                    let dir_path = if prefix.is_empty() {
                        dir.to_string()
                    } else {
                        format!("{}/{}", prefix, dir)
                    };
                    entries.push(DirectoryEntry {
                        name: dir.to_string(),
                        path: dir_path,
                        sha: String::new(),
                        download_url: None,
                        kind: "dir".to_string(),
                    });
                }
                None => entries.push(DirectoryEntry {
                    name: rest.to_string(),
                    path: path.clone(),
                    sha: file.sha.clone(),
                    download_url: Some(format!("memory://{}", path)),
                    kind: "file".to_string(),
                }),
            }
        }

        if entries.is_empty() {
            return Err(not_found());
        }
        Ok(entries)
    }

    async fn fetch_metadata(
        &self,
        _access: &RepoAccess,
        entry: &DirectoryEntry,
    ) -> StoreResult<AssetMetadata> {
        let mut state = self.state();
        state.record(StoreOp::FetchMetadata, &entry.path, None)?;
        let file = state.files.get(&entry.path).ok_or_else(not_found)?;
        serde_json::from_slice(&file.content).map_err(|e| {
            StoreError::Decode(format!("Invalid metadata document {}: {}", entry.path, e))
        })
    }
}
