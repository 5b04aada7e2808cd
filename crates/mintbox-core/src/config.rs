//! Configuration module
//!
//! Settings are read from the environment (and a `.env` file when present). Repository
//! credentials may be left empty here: the editor validates them when a workflow starts,
//! so a shell can fill them in later.

use std::env;

use crate::constants::{
    CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_BRANCH, DEFAULT_PATH_PREFIX, GITHUB_API_URL,
    GITHUB_API_VERSION, GITHUB_RAW_URL,
};
use crate::models::RepoAccess;

/// Remote store settings
#[derive(Clone, Debug)]
pub struct GitHubSettings {
    pub access: RepoAccess,
    pub api_url: String,
    pub raw_url: String,
    pub api_version: String,
    /// Per-request timeout; `None` leaves requests unbounded
    pub timeout_secs: Option<u64>,
}

/// Drawing surface settings
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub font_path: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            font_path: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EditorConfig {
    pub github: GitHubSettings,
    pub render: RenderSettings,
    pub path_prefix: String,
}

impl EditorConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let parse_u32 = |key: &str, default: u32| -> Result<u32, anyhow::Error> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
                _ => Ok(default),
            }
        };

        let timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(v) if !v.trim().is_empty() => Some(
                v.trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a valid number"))?,
            ),
            _ => None,
        };

        let config = EditorConfig {
            github: GitHubSettings {
                access: RepoAccess {
                    token: var("GITHUB_TOKEN", ""),
                    owner: var("GITHUB_OWNER", ""),
                    repo: var("GITHUB_REPO", ""),
                    branch: var("GITHUB_BRANCH", DEFAULT_BRANCH),
                },
                api_url: var("GITHUB_API_URL", GITHUB_API_URL),
                raw_url: var("GITHUB_RAW_URL", GITHUB_RAW_URL),
                api_version: var("GITHUB_API_VERSION", GITHUB_API_VERSION),
                timeout_secs,
            },
            render: RenderSettings {
                width: parse_u32("CANVAS_WIDTH", CANVAS_WIDTH)?,
                height: parse_u32("CANVAS_HEIGHT", CANVAS_HEIGHT)?,
                font_path: lookup("MINTBOX_FONT_PATH").filter(|v| !v.trim().is_empty()),
            },
            path_prefix: var("MINTBOX_PATH_PREFIX", DEFAULT_PATH_PREFIX),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.render.width == 0 || self.render.height == 0 {
            return Err(anyhow::anyhow!(
                "CANVAS_WIDTH and CANVAS_HEIGHT must be greater than zero"
            ));
        }

        for (key, url) in [
            ("GITHUB_API_URL", &self.github.api_url),
            ("GITHUB_RAW_URL", &self.github.raw_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!("{} must be an http(s) URL", key));
            }
        }

        if self.github.timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("HTTP_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(())
    }

    pub fn access(&self) -> &RepoAccess {
        &self.github.access
    }
}
