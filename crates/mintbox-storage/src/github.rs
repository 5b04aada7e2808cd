//! GitHub Contents API store
//!
//! Files live in a repository branch. Writes and deletes are commits; the `sha` of a
//! file is its git blob id.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use mintbox_core::{AssetMetadata, DirectoryEntry, RemoteFileHandle, RepoAccess};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::keys::{contents_endpoint, normalize_prefix, validate_path};
use crate::traits::{AssetStore, StoreError, StoreResult};

const ACCEPT: &str = "application/vnd.github+json";
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Serialize)]
struct PutFileBody<'a> {
    message: String,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteFileBody<'a> {
    message: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize, Default)]
struct WriteResponse {
    #[serde(default)]
    content: Option<ContentInfo>,
    #[serde(default)]
    commit: Option<CommitInfo>,
}

#[derive(Deserialize)]
struct ContentInfo {
    path: String,
    sha: String,
}

#[derive(Deserialize)]
struct CommitInfo {
    sha: String,
}

#[derive(Deserialize)]
struct FileResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

/// `AssetStore` backed by the GitHub REST API.
#[derive(Clone, Debug)]
pub struct GitHubStore {
    client: Client,
    api_url: String,
    api_version: String,
}

impl GitHubStore {
    /// Create a store talking to `api_url` (e.g. `https://api.github.com`).
    ///
    /// Without a `timeout` requests wait until the transport itself gives up.
    pub fn new(
        api_url: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Option<Duration>,
    ) -> StoreResult<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_url, endpoint)
    }

    fn apply_headers(&self, request: RequestBuilder, access: &RepoAccess) -> RequestBuilder {
        request
            .header("Authorization", format!("token {}", access.token))
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", self.api_version.as_str())
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// Turn a non-success response into `StoreError::Remote`, keeping the remote's
    /// `message` and `errors` detail when the body is structured.
    async fn error_from_response(response: Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<RemoteErrorBody>(&body) {
            Ok(parsed) => {
                let mut message = parsed
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
                if let Some(errors) = parsed.errors {
                    message.push('\n');
                    message.push_str(&errors.to_string());
                }
                message
            }
            Err(_) if body.trim().is_empty() => {
                status.canonical_reason().unwrap_or("").to_string()
            }
            Err(_) => body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
        };

        StoreError::Remote {
            status: status.as_u16(),
            message,
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn get_contents(
        &self,
        access: &RepoAccess,
        path: &str,
    ) -> StoreResult<serde_json::Value> {
        let url = self.build_url(&contents_endpoint(&access.owner, &access.repo, path));
        let request = self
            .client
            .get(&url)
            .query(&[("ref", access.branch.as_str())]);
        let response = self.send(self.apply_headers(request, access)).await?;
        Self::parse_json(response).await
    }

    fn parse_metadata(path: &str, bytes: &[u8]) -> StoreResult<AssetMetadata> {
        serde_json::from_slice(bytes)
            .map_err(|e| StoreError::Decode(format!("Invalid metadata document {}: {}", path, e)))
    }
}

#[async_trait]
impl AssetStore for GitHubStore {
    async fn put_file(
        &self,
        access: &RepoAccess,
        path: &str,
        content_base64: &str,
        message: Option<&str>,
        current_sha: Option<&str>,
    ) -> StoreResult<RemoteFileHandle> {
        validate_path(path)?;
        let start = Instant::now();

        let body = PutFileBody {
            message: message
                .map(String::from)
                .unwrap_or_else(|| format!("Add {}", path)),
            content: content_base64,
            branch: &access.branch,
            sha: current_sha,
        };

        let url = self.build_url(&contents_endpoint(&access.owner, &access.repo, path));
        let request = self.apply_headers(self.client.put(&url), access).json(&body);
        let response = self.send(request).await.inspect_err(|e| {
            tracing::warn!(error = %e, path = %path, "GitHub put_file failed");
        })?;

        let parsed: WriteResponse = Self::parse_json(response).await?;
        let content = parsed
            .content
            .ok_or_else(|| StoreError::Decode(format!("No content in put response for {}", path)))?;

        tracing::info!(
            path = %content.path,
            sha = %content.sha,
            size_bytes = content_base64.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GitHub put_file successful"
        );

        Ok(RemoteFileHandle {
            path: content.path,
            sha: content.sha,
            commit_sha: parsed.commit.map(|c| c.sha),
        })
    }

    async fn delete_file(
        &self,
        access: &RepoAccess,
        path: &str,
        sha: &str,
        message: Option<&str>,
    ) -> StoreResult<RemoteFileHandle> {
        validate_path(path)?;
        let start = Instant::now();

        let body = DeleteFileBody {
            message: message
                .map(String::from)
                .unwrap_or_else(|| format!("Delete {}", path)),
            sha,
            branch: &access.branch,
        };

        let url = self.build_url(&contents_endpoint(&access.owner, &access.repo, path));
        let request = self
            .apply_headers(self.client.delete(&url), access)
            .json(&body);
        let response = self.send(request).await.inspect_err(|e| {
            tracing::warn!(error = %e, path = %path, sha = %sha, "GitHub delete_file failed");
        })?;

        // The body only carries the commit; an unreadable one does not undo the delete.
        let parsed: WriteResponse = Self::parse_json(response).await.unwrap_or_default();

        tracing::info!(
            path = %path,
            sha = %sha,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GitHub delete_file successful"
        );

        Ok(RemoteFileHandle {
            path: path.to_string(),
            sha: sha.to_string(),
            commit_sha: parsed.commit.map(|c| c.sha),
        })
    }

    async fn get_file_revision(&self, access: &RepoAccess, path: &str) -> StoreResult<String> {
        validate_path(path)?;

        let value = self.get_contents(access, path).await?;
        if value.is_array() {
            return Err(StoreError::Decode(format!("{} is a directory", path)));
        }
        let file: FileResponse =
            serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))?;

        tracing::debug!(path = %path, sha = %file.sha, "Fetched file revision");
        Ok(file.sha)
    }

    async fn list_entries(
        &self,
        access: &RepoAccess,
        prefix: &str,
    ) -> StoreResult<Vec<DirectoryEntry>> {
        let prefix = normalize_prefix(prefix)?;
        let start = Instant::now();

        let value = self.get_contents(access, prefix).await.inspect_err(|e| {
            tracing::warn!(error = %e, prefix = %prefix, "GitHub directory listing failed");
        })?;
        if !value.is_array() {
            return Err(StoreError::Decode(format!("{} is not a directory", prefix)));
        }
        let entries: Vec<DirectoryEntry> =
            serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))?;

        tracing::info!(
            prefix = %prefix,
            entries = entries.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GitHub directory listing successful"
        );

        Ok(entries)
    }

    async fn fetch_metadata(
        &self,
        access: &RepoAccess,
        entry: &DirectoryEntry,
    ) -> StoreResult<AssetMetadata> {
        match entry.download_url.as_deref() {
            Some(download_url) => {
                let request = self.apply_headers(self.client.get(download_url), access);
                let response = self.send(request).await?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| StoreError::Transport(e.to_string()))?;
                Self::parse_metadata(&entry.path, &bytes)
            }
            None => {
                validate_path(&entry.path)?;
                let value = self.get_contents(access, &entry.path).await?;
                let file: FileResponse = serde_json::from_value(value)
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                let encoded: String = file
                    .content
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|e| StoreError::Decode(format!("Invalid base64 content: {}", e)))?;
                Self::parse_metadata(&entry.path, &bytes)
            }
        }
    }
}
