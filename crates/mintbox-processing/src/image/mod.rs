//! Image generation module
//!
//! - Procedural NFT artwork (generator)
//! - System font discovery (font)
//! - Raster fills not covered by imageproc (shapes)

pub mod font;
pub mod generator;
pub mod shapes;

pub use generator::NftRenderer;
