//! Mintbox Services Layer
//!
//! This crate hosts the editor controller that orchestrates the mint, list and remove
//! workflows, and re-exports the storage and processing API so that the CLI depends on
//! a single facade.

pub mod confirm;
pub mod editor;
pub mod workflow;

pub use confirm::Confirm;
pub use editor::{Draft, EditorSnapshot, ExportedFile, NftEditor};
pub use workflow::{
    ActivityLog, Dispatch, ListError, LogEntry, MintError, MintReport, OrphanError,
    OrphanReport, RemoveError, RemoveOutcome, Status, StatusKind, WorkflowKind, WorkflowStatus,
    WorkflowTracker,
};

pub use mintbox_processing::{ExportFormat, ImageExporter, NftRenderer, RenderError};
pub use mintbox_storage::{create_store, AssetStore, StoreError, StoreResult};
