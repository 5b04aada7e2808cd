//! Mintbox Core Library
//!
//! This crate provides the domain models, error types, configuration, path rules and
//! random content generation shared by every Mintbox component.

pub mod config;
pub mod constants;
pub mod content;
pub mod error;
pub mod models;
pub mod paths;

// Re-export commonly used types
pub use config::{EditorConfig, GitHubSettings, RenderSettings};
pub use error::{ErrorMetadata, LogLevel, ValidationError};
pub use models::{AssetMetadata, AssetRecord, DirectoryEntry, RemoteFileHandle, RepoAccess};
pub use paths::{derive_image_path, sanitize_title, AssetPaths};
