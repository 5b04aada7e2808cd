//! Mintbox Processing Library
//!
//! This crate renders the generated NFT artwork and encodes it for upload and export.

pub mod error;
pub mod export;
pub mod image;

pub use error::RenderError;
pub use export::{encode_png_base64, ExportFormat, ImageExporter};
pub use crate::image::NftRenderer;
