//! NFT editor controller
//!
//! `NftEditor` owns the draft, the repository settings, the displayed collection, the
//! status line, the activity log and the preview surface. All of it lives in one
//! mutex-guarded state struct that workflows update between steps; the lock is never
//! held while a store call or a render is in flight.
//!
//! Every workflow boundary catches its errors: they are written to the status line
//! and, depending on [`ErrorMetadata::writes_activity_log`], the activity log, and are
//! also returned to the caller.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use mintbox_core::constants::{DEFAULT_DESCRIPTION, DEFAULT_TITLE};
use mintbox_core::content::{random_description, random_title};
use mintbox_core::paths::{derive_image_path, derive_metadata_path, file_stem, raw_content_url};
use mintbox_core::{
    AssetMetadata, AssetPaths, AssetRecord, DirectoryEntry, EditorConfig, ErrorMetadata,
    LogLevel, RemoteFileHandle, RepoAccess,
};
use mintbox_processing::{
    encode_png_base64, ExportFormat, ImageExporter, NftRenderer, RenderError,
};
use mintbox_storage::AssetStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::confirm::Confirm;
use crate::workflow::{
    ActivityLog, Dispatch, ListError, MintError, MintReport, OrphanError, OrphanReport,
    RemoveError, RemoveOutcome, Status, WorkflowKind, WorkflowTracker,
};

/// The user-editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub title: String,
    pub description: String,
}

/// A preview encoded for download.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    /// `{sanitized title}_{epoch millis}.{ext}`
    pub file_name: String,
    /// Format actually produced (AVIF may fall back to PNG)
    pub format: ExportFormat,
    pub bytes: Bytes,
}

/// Point-in-time copy of the editor state for display.
#[derive(Debug, Clone, Serialize)]
pub struct EditorSnapshot {
    pub draft: Draft,
    pub repository: String,
    pub branch: String,
    pub path_prefix: String,
    pub assets: Vec<AssetRecord>,
    pub status: Status,
    pub log: ActivityLog,
    pub workflows: WorkflowTracker,
    pub has_preview: bool,
}

struct EditorState {
    draft: Draft,
    access: RepoAccess,
    path_prefix: String,
    assets: Vec<AssetRecord>,
    status: Status,
    log: ActivityLog,
    workflows: WorkflowTracker,
    preview: Option<Arc<RgbaImage>>,
    rng: StdRng,
}

impl EditorState {
    /// Report a workflow failure on the status line and, when the error asks for it,
    /// in the activity log.
    fn report<E>(&mut self, err: &E, status_prefix: &str, log_prefix: &str)
    where
        E: ErrorMetadata + Display,
    {
        let code = err.error_code();
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(error = %err, code, "Workflow rejected"),
            LogLevel::Warn => tracing::warn!(error = %err, code, "Workflow failed"),
            LogLevel::Error => tracing::error!(error = %err, code, "Workflow failed"),
        }

        if err.writes_activity_log() {
            self.log.push(format!("{}{}", log_prefix, err));
            self.status = Status::error(format!("{}{}", status_prefix, err));
        } else {
            self.status = Status::error(err.to_string());
        }
    }

    /// Seed for one render; the editor RNG advances once per render.
    fn next_seed(&mut self) -> u64 {
        self.rng.random()
    }
}

pub struct NftEditor {
    store: Arc<dyn AssetStore>,
    renderer: NftRenderer,
    raw_url: String,
    state: Mutex<EditorState>,
}

impl NftEditor {
    pub fn new(store: Arc<dyn AssetStore>, renderer: NftRenderer, config: &EditorConfig) -> Self {
        let state = EditorState {
            draft: Draft {
                title: DEFAULT_TITLE.to_string(),
                description: DEFAULT_DESCRIPTION.to_string(),
            },
            access: config.access().clone(),
            path_prefix: config.path_prefix.clone(),
            assets: Vec::new(),
            status: Status::default(),
            log: ActivityLog::default(),
            workflows: WorkflowTracker::default(),
            preview: None,
            rng: StdRng::from_os_rng(),
        };

        Self {
            store,
            renderer,
            raw_url: config.github.raw_url.clone(),
            state: Mutex::new(state),
        }
    }

    /// Make every random choice reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.state.get_mut().rng = StdRng::seed_from_u64(seed);
        self
    }

    pub async fn set_title(&self, title: impl Into<String>) {
        self.state.lock().await.draft.title = title.into().trim().to_string();
    }

    pub async fn set_description(&self, description: impl Into<String>) {
        self.state.lock().await.draft.description = description.into().trim().to_string();
    }

    pub async fn set_access(&self, access: RepoAccess) {
        self.state.lock().await.access = access;
    }

    pub async fn set_path_prefix(&self, prefix: impl Into<String>) {
        self.state.lock().await.path_prefix = prefix.into().trim().to_string();
    }

    pub async fn draft(&self) -> Draft {
        self.state.lock().await.draft.clone()
    }

    pub async fn assets(&self) -> Vec<AssetRecord> {
        self.state.lock().await.assets.clone()
    }

    pub async fn status(&self) -> Status {
        self.state.lock().await.status.clone()
    }

    pub async fn preview(&self) -> Option<Arc<RgbaImage>> {
        self.state.lock().await.preview.clone()
    }

    /// Lets a shell disable the control of a running workflow.
    pub async fn is_running(&self, kind: WorkflowKind) -> bool {
        self.state.lock().await.workflows.is_running(kind)
    }

    pub async fn snapshot(&self) -> EditorSnapshot {
        let state = self.state.lock().await;
        EditorSnapshot {
            draft: state.draft.clone(),
            repository: state.access.slug(),
            branch: state.access.branch.clone(),
            path_prefix: state.path_prefix.clone(),
            assets: state.assets.clone(),
            status: state.status.clone(),
            log: state.log.clone(),
            workflows: state.workflows.clone(),
            has_preview: state.preview.is_some(),
        }
    }

    async fn render(
        &self,
        title: String,
        seed: u64,
        now: DateTime<Utc>,
    ) -> Result<RgbaImage, RenderError> {
        let renderer = self.renderer.clone();
        tokio::task::spawn_blocking(move || {
            renderer.render(&title, now, &mut StdRng::seed_from_u64(seed))
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?
    }

    /// Redraw the preview from the current title.
    pub async fn refresh_preview(&self) -> Result<Arc<RgbaImage>, RenderError> {
        let (title, seed) = {
            let mut state = self.state.lock().await;
            (state.draft.title.clone(), state.next_seed())
        };

        let preview = Arc::new(self.render(title, seed, Utc::now()).await?);

        let mut state = self.state.lock().await;
        state.preview = Some(preview.clone());
        state.status = Status::success("Preview drawn.");
        Ok(preview)
    }

    /// Replace the draft with a random title and description and redraw.
    pub async fn regenerate(&self) -> Result<Draft, RenderError> {
        let (draft, seed) = {
            let mut state = self.state.lock().await;
            let title = random_title(&mut state.rng);
            let description = random_description(&mut state.rng);
            state.draft = Draft { title, description };
            (state.draft.clone(), state.next_seed())
        };

        let preview = Arc::new(self.render(draft.title.clone(), seed, Utc::now()).await?);

        let mut state = self.state.lock().await;
        state.preview = Some(preview);
        state.status = Status::success("Preview drawn with new random title and description.");
        Ok(draft)
    }

    pub async fn export(&self, format: ExportFormat) -> Result<ExportedFile, RenderError> {
        self.export_at(format, Utc::now()).await
    }

    /// Encode the current preview (drawing one first if there is none).
    pub async fn export_at(
        &self,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> Result<ExportedFile, RenderError> {
        let result = self.encode_preview(format).await;

        let mut state = self.state.lock().await;
        match result {
            Ok((bytes, produced)) => {
                if produced == format {
                    state.status = Status::success(format!(
                        "Downloaded as {}",
                        format.extension().to_uppercase()
                    ));
                } else {
                    state.status = Status::error(format!(
                        "{} not supported - exporting {} instead",
                        format.extension().to_uppercase(),
                        produced.extension().to_uppercase()
                    ));
                }
                let file_name = format!(
                    "{}_{}.{}",
                    file_stem(&state.draft.title),
                    now.timestamp_millis(),
                    produced.extension()
                );
                tracing::info!(
                    file_name = %file_name,
                    size_bytes = bytes.len(),
                    "Preview exported"
                );
                Ok(ExportedFile {
                    file_name,
                    format: produced,
                    bytes,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, format = %format, "Export failed");
                state.status = Status::error(format!("Download failed: {}", e));
                Err(e)
            }
        }
    }

    async fn encode_preview(
        &self,
        format: ExportFormat,
    ) -> Result<(Bytes, ExportFormat), RenderError> {
        let preview = match self.preview().await {
            Some(preview) => preview,
            None => self.refresh_preview().await?,
        };
        tokio::task::spawn_blocking(move || ImageExporter::encode(&preview, format))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }

    pub async fn mint(&self) -> Dispatch<Result<MintReport, MintError>> {
        self.mint_at(Utc::now()).await
    }

    /// Render the current draft and push image, then metadata. `now` supplies both the
    /// path timestamp and `created_at`.
    pub async fn mint_at(&self, now: DateTime<Utc>) -> Dispatch<Result<MintReport, MintError>> {
        let (access, prefix, draft, seed) = {
            let mut state = self.state.lock().await;
            if !state.workflows.try_start(WorkflowKind::Mint) {
                tracing::debug!("Mint already running");
                return Dispatch::AlreadyRunning;
            }
            (
                state.access.clone(),
                state.path_prefix.clone(),
                state.draft.clone(),
                state.next_seed(),
            )
        };

        let span = tracing::info_span!("mint", run_id = %Uuid::new_v4());
        let result = self
            .run_mint(access, prefix, draft, seed, now)
            .instrument(span)
            .await;

        self.state
            .lock()
            .await
            .workflows
            .finish(WorkflowKind::Mint, result.is_ok());
        Dispatch::Ran(result)
    }

    async fn run_mint(
        &self,
        access: RepoAccess,
        prefix: String,
        draft: Draft,
        seed: u64,
        now: DateTime<Utc>,
    ) -> Result<MintReport, MintError> {
        let start = Instant::now();

        if let Err(e) = access.validate() {
            let err = MintError::from(e);
            self.state.lock().await.report(&err, "Error: ", "ERROR: ");
            return Err(err);
        }

        self.state.lock().await.log.push("--- Starting generation ---");

        // Render failures abort without touching the status line or the log.
        let renderer = self.renderer.clone();
        let title = draft.title.clone();
        let (preview, content) = tokio::task::spawn_blocking(move || {
            let img = renderer.render(&title, now, &mut StdRng::seed_from_u64(seed))?;
            let content = encode_png_base64(&img)?;
            Ok::<_, RenderError>((img, content))
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))??;

        let paths = AssetPaths::new(&prefix, &draft.title, now.timestamp_millis());
        {
            let mut state = self.state.lock().await;
            state.preview = Some(Arc::new(preview));
            state.status = Status::success("Canvas generated. Preparing upload...");
            state.log.push(format!(
                "Uploading image to {}/{}",
                access.slug(),
                paths.image_path
            ));
        }

        let image_message = format!("Add NFT image {}", paths.image_path);
        let image = match self
            .store
            .put_file(&access, &paths.image_path, &content, Some(&image_message), None)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                let err = MintError::ImageUpload(e);
                self.state.lock().await.report(&err, "Error: ", "ERROR: ");
                return Err(err);
            }
        };

        let image_url = raw_content_url(
            &self.raw_url,
            &access.owner,
            &access.repo,
            &access.branch,
            &paths.image_path,
        );
        let document = AssetMetadata::new(&draft.title, &draft.description, &image_url, now);
        let encoded = match document.to_document() {
            Ok(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
            Err(e) => {
                let err = MintError::MetadataEncode(e.to_string());
                self.state.lock().await.report(&err, "Error: ", "ERROR: ");
                return Err(err);
            }
        };

        self.state.lock().await.log.push(format!(
            "Uploading metadata to {}/{}",
            access.slug(),
            paths.metadata_path
        ));

        let metadata_message = format!("Add NFT metadata {}", paths.metadata_path);
        let metadata = match self
            .store
            .put_file(
                &access,
                &paths.metadata_path,
                &encoded,
                Some(&metadata_message),
                None,
            )
            .await
        {
            Ok(handle) => handle,
            Err(source) => {
                let err = MintError::MetadataUpload {
                    orphaned_image: image,
                    source,
                };
                let mut state = self.state.lock().await;
                state.report(&err, "Error: ", "ERROR: ");
                state.log.push(format!(
                    "Image {} was uploaded without metadata",
                    paths.image_path
                ));
                return Err(err);
            }
        };

        {
            let mut state = self.state.lock().await;
            state.status = Status::success("Done: image + metadata pushed.");
            state.log.push(format!("All done. Image: {}", image_url));
        }

        tracing::info!(
            image_path = %paths.image_path,
            metadata_path = %paths.metadata_path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Mint completed"
        );

        Ok(MintReport {
            paths,
            image,
            metadata,
            image_url,
            document,
        })
    }

    /// Replace the displayed collection with a fresh listing of the prefix.
    pub async fn list(&self) -> Dispatch<Result<Vec<AssetRecord>, ListError>> {
        let (access, prefix) = {
            let mut state = self.state.lock().await;
            if !state.workflows.try_start(WorkflowKind::List) {
                tracing::debug!("List already running");
                return Dispatch::AlreadyRunning;
            }
            (state.access.clone(), state.path_prefix.clone())
        };

        let span = tracing::info_span!("list", run_id = %Uuid::new_v4());
        let result = self.run_list(access, prefix).instrument(span).await;

        self.state
            .lock()
            .await
            .workflows
            .finish(WorkflowKind::List, result.is_ok());
        Dispatch::Ran(result)
    }

    async fn run_list(
        &self,
        access: RepoAccess,
        prefix: String,
    ) -> Result<Vec<AssetRecord>, ListError> {
        let start = Instant::now();

        {
            let mut state = self.state.lock().await;
            if let Err(e) = access.validate() {
                let err = ListError::from(e);
                state.report(&err, "Error listing NFTs: ", "ERROR: ");
                return Err(err);
            }
            state.log.push("--- Listing NFTs ---");
            state.status = Status::success("Loading...");
        }

        let result = self.store.list_assets(&access, &prefix).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(records) => {
                state.status = if records.is_empty() {
                    Status::success("No NFTs found.")
                } else {
                    Status::success(format!("Listed {} NFTs.", records.len()))
                };
                state.assets = records.clone();
                tracing::info!(
                    prefix = %prefix,
                    count = records.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Listing completed"
                );
                Ok(records)
            }
            Err(e) => {
                let err = ListError::Store(e);
                state.assets.clear();
                state.report(&err, "Error listing NFTs: ", "ERROR: ");
                Err(err)
            }
        }
    }

    /// Delete a record's metadata document, then its image, then re-list.
    ///
    /// Declining the confirmation is a no-op. A failure stops the workflow without
    /// compensation and without refreshing the collection.
    pub async fn remove(
        &self,
        record: &AssetRecord,
        confirm: &dyn Confirm,
    ) -> Dispatch<Result<RemoveOutcome, RemoveError>> {
        if self.is_running(WorkflowKind::Remove).await {
            tracing::debug!("Remove already running");
            return Dispatch::AlreadyRunning;
        }

        let prompt = format!(
            "Remove NFT: {} and {}?",
            record.metadata_path, record.image_path
        );
        if !confirm.confirm(&prompt) {
            tracing::debug!(metadata_path = %record.metadata_path, "Remove declined");
            return Dispatch::Ran(Ok(RemoveOutcome::Declined));
        }

        let access = {
            let mut state = self.state.lock().await;
            if !state.workflows.try_start(WorkflowKind::Remove) {
                return Dispatch::AlreadyRunning;
            }
            state.access.clone()
        };

        let span = tracing::info_span!(
            "remove",
            run_id = %Uuid::new_v4(),
            metadata_path = %record.metadata_path
        );
        let result = self.run_remove(access, record).instrument(span).await;

        self.state
            .lock()
            .await
            .workflows
            .finish(WorkflowKind::Remove, result.is_ok());

        if result.is_ok() {
            // A list already in flight will resynchronize the collection itself.
            let _ = self.list().await;
        }
        Dispatch::Ran(result)
    }

    async fn run_remove(
        &self,
        access: RepoAccess,
        record: &AssetRecord,
    ) -> Result<RemoveOutcome, RemoveError> {
        if let Err(e) = access.validate() {
            let err = RemoveError::from(e);
            return Err(self.fail_remove(err).await);
        }

        let image_sha = match self
            .store
            .get_file_revision(&access, &record.image_path)
            .await
        {
            Ok(sha) => sha,
            Err(e) => return Err(self.fail_remove(RemoveError::Revision(e)).await),
        };

        let metadata_message = format!("Remove NFT metadata {}", record.metadata_path);
        let metadata = match self
            .store
            .delete_file(
                &access,
                &record.metadata_path,
                &record.metadata_sha,
                Some(&metadata_message),
            )
            .await
        {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail_remove(RemoveError::MetadataDelete(e)).await),
        };

        let image_message = format!("Remove NFT image {}", record.image_path);
        let image = match self
            .store
            .delete_file(&access, &record.image_path, &image_sha, Some(&image_message))
            .await
        {
            Ok(handle) => handle,
            Err(source) => {
                return Err(self
                    .fail_remove(RemoveError::ImageDelete {
                        deleted_metadata: metadata,
                        source,
                    })
                    .await)
            }
        };

        {
            let mut state = self.state.lock().await;
            let message = format!("Removed {} and {}", record.metadata_path, record.image_path);
            state.log.push(message.clone());
            state.status = Status::success(message);
        }

        tracing::info!(
            metadata_path = %record.metadata_path,
            image_path = %record.image_path,
            "Remove completed"
        );

        Ok(RemoveOutcome::Removed { metadata, image })
    }

    async fn fail_remove(&self, err: RemoveError) -> RemoveError {
        self.state
            .lock()
            .await
            .report(&err, "Error removing NFT: ", "Error removing: ");
        err
    }

    /// Find files under the prefix whose sibling is missing. Read-only.
    pub async fn scan_orphans(&self) -> Result<OrphanReport, OrphanError> {
        let (access, prefix) = {
            let state = self.state.lock().await;
            (state.access.clone(), state.path_prefix.clone())
        };

        let result = match access.validate() {
            Ok(()) => self
                .store
                .list_entries(&access, &prefix)
                .await
                .map(|entries| find_orphans(&entries))
                .map_err(OrphanError::from),
            Err(e) => Err(OrphanError::from(e)),
        };

        let mut state = self.state.lock().await;
        match result {
            Ok(report) => {
                let message = format!(
                    "Orphan scan: {} images without metadata, {} metadata documents \
                     without an image",
                    report.images_without_metadata.len(),
                    report.metadata_without_image.len()
                );
                state.log.push(message.clone());
                state.status = Status::success(message);
                Ok(report)
            }
            Err(err) => {
                state.report(&err, "Error scanning for orphans: ", "ERROR: ");
                Err(err)
            }
        }
    }

    /// Delete one orphan found by [`NftEditor::scan_orphans`], using its listed revision.
    pub async fn purge_orphan(
        &self,
        entry: &DirectoryEntry,
    ) -> Result<RemoteFileHandle, OrphanError> {
        let access = self.state.lock().await.access.clone();

        let result = match access.validate() {
            Ok(()) => {
                let message = format!("Remove orphaned file {}", entry.path);
                self.store
                    .delete_file(&access, &entry.path, &entry.sha, Some(&message))
                    .await
                    .map_err(OrphanError::from)
            }
            Err(e) => Err(OrphanError::from(e)),
        };

        let mut state = self.state.lock().await;
        match result {
            Ok(handle) => {
                let message = format!("Removed orphan {}", entry.path);
                state.log.push(message.clone());
                state.status = Status::success(message);
                Ok(handle)
            }
            Err(err) => {
                state.report(&err, "Error removing orphan: ", "ERROR: ");
                Err(err)
            }
        }
    }
}

/// Pair listing entries by base name.
fn find_orphans(entries: &[DirectoryEntry]) -> OrphanReport {
    let files: HashSet<&str> = entries
        .iter()
        .filter(|e| e.kind == "file")
        .map(|e| e.path.as_str())
        .collect();

    let mut report = OrphanReport::default();
    for entry in entries.iter().filter(|e| e.kind == "file") {
        if entry.is_image() && !files.contains(derive_metadata_path(&entry.path).as_str()) {
            report.images_without_metadata.push(entry.clone());
        } else if entry.is_metadata() && !files.contains(derive_image_path(&entry.path).as_str()) {
            report.metadata_without_image.push(entry.clone());
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: &str) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            path: format!("nfts/{}", name),
            sha: format!("sha-{}", name),
            download_url: None,
            kind: kind.to_string(),
        }
    }

    #[test]
    fn orphans_are_files_missing_their_sibling() {
        let entries = vec![
            entry("a.json", "file"),
            entry("a.png", "file"),
            entry("b.png", "file"),
            entry("c.json", "file"),
            entry("README.md", "file"),
            entry("d.png", "dir"),
        ];
        let report = find_orphans(&entries);
        let images: Vec<&str> = report
            .images_without_metadata
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        let docs: Vec<&str> = report
            .metadata_without_image
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(images, vec!["b.png"]);
        assert_eq!(docs, vec!["c.json"]);
        assert_eq!(report.total(), 2);
    }
}
