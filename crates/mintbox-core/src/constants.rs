//! Shared constants

/// Extension of the JSON metadata document of an asset.
pub const METADATA_EXTENSION: &str = ".json";

/// Extension of the image document paired with a metadata document.
pub const IMAGE_EXTENSION: &str = ".png";

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PATH_PREFIX: &str = "nfts";

pub const DEFAULT_TITLE: &str = "My NFT";
pub const DEFAULT_DESCRIPTION: &str = "Generated from GitHub Pages NFT Editor";

/// File name stem used when a blank title is exported.
pub const FALLBACK_FILE_STEM: &str = "My_NFT";

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_RAW_URL: &str = "https://raw.githubusercontent.com";
pub const GITHUB_API_VERSION: &str = "2022-11-28";

pub const CANVAS_WIDTH: u32 = 2048;
pub const CANVAS_HEIGHT: u32 = 1152;
