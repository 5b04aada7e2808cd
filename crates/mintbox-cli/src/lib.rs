//! Helpers shared by the `mintbox` binary.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use mintbox_core::{AssetRecord, EditorConfig};
use mintbox_services::{Confirm, ExportedFile, Status, StatusKind};
use serde::Serialize;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so that stdout stays parseable.
///
/// `RUST_LOG` controls the filter (default `info`); `LOG_FORMAT=json` switches to
/// JSON lines.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Repository coordinates that override the environment. The token is only read from
/// `GITHUB_TOKEN`.
#[derive(Debug, Clone, Default, Args)]
pub struct RepoArgs {
    /// Repository owner (GITHUB_OWNER)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Repository name (GITHUB_REPO)
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Branch to read and write (GITHUB_BRANCH)
    #[arg(long, global = true)]
    pub branch: Option<String>,

    /// Directory inside the repository (MINTBOX_PATH_PREFIX)
    #[arg(long, global = true)]
    pub prefix: Option<String>,
}

impl RepoArgs {
    pub fn apply(&self, config: &mut EditorConfig) {
        let access = &mut config.github.access;
        if let Some(owner) = &self.owner {
            access.owner = owner.trim().to_string();
        }
        if let Some(repo) = &self.repo {
            access.repo = repo.trim().to_string();
        }
        if let Some(branch) = &self.branch {
            access.branch = branch.trim().to_string();
        }
        if let Some(prefix) = &self.prefix {
            config.path_prefix = prefix.trim().to_string();
        }
    }
}

/// `y` or `yes`, any case. Everything else declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks on stderr and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = io::stderr();
        if write!(stderr, "{} [y/N] ", prompt).and_then(|_| stderr.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", s);
    Ok(())
}

/// Print the status line to stderr, prefixed by its kind.
pub fn print_status(status: &Status) {
    if status.message.is_empty() {
        return;
    }
    match status.kind {
        StatusKind::Error => eprintln!("error: {}", status.message),
        StatusKind::Success => eprintln!("ok: {}", status.message),
        StatusKind::Neutral => eprintln!("{}", status.message),
    }
}

/// One line per asset: name, creation time, metadata path.
pub fn format_asset_table(assets: &[AssetRecord]) -> String {
    let mut out = format!("{:<32} {:<26} {}\n", "NAME", "CREATED", "METADATA");
    for asset in assets {
        out.push_str(&format!(
            "{:<32} {:<26} {}\n",
            truncate_string(&asset.name, 32),
            truncate_string(&asset.created_at, 26),
            asset.metadata_path
        ));
    }
    out
}

/// Write an exported preview into `dir` under its generated file name.
pub fn write_export(dir: &Path, file: &ExportedFile) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(&file.file_name);
    std::fs::write(&path, &file.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
