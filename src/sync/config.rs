// src/sync/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_SYNC_CONFIG_PATH: &str = "sync_config.json";
pub const DEFAULT_KEEP_RECENT: usize = 5;

fn default_keep_recent() -> usize {
    DEFAULT_KEEP_RECENT
}
fn default_git_remote() -> String {
    "origin".to_string()
}

/// Where copied files go: the local filesystem or a host reached over ssh/scp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Local,
    Remote,
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(format!("unknown sync mode '{other}' (expected local|remote)")),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Remote => "remote",
        })
    }
}

/// One content provider: dated folders under `local_path` are mirrored into
/// `remote_path` (a path on the remote host, or a local path in local mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSource {
    pub name: String,
    pub local_path: PathBuf,
    #[serde(alias = "destination")]
    pub remote_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitPublish {
    pub repo_dir: PathBuf,
    #[serde(default = "default_git_remote")]
    pub remote: String,
    /// Push target; `None` pushes the current branch's upstream.
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SyncConfigFile")]
pub struct SyncConfig {
    pub mode: SyncMode,
    pub host: String,
    pub username: String,
    pub private_key_path: String,
    pub keep_recent: usize,
    pub sources: Vec<SyncSource>,
    /// Aggregate of all sources' latest summaries is written here after a sync.
    pub combined_file: Option<PathBuf>,
    pub git: Option<GitPublish>,
}

/// On-disk shape. Also accepts the older single-source layout where
/// `local_path` / `remote_path` sit at the top level.
#[derive(Debug, Deserialize)]
struct SyncConfigFile {
    #[serde(default)]
    mode: SyncMode,
    #[serde(default)]
    host: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    private_key_path: String,
    #[serde(default = "default_keep_recent")]
    keep_recent: usize,
    #[serde(default)]
    sources: Vec<SyncSource>,
    #[serde(default)]
    combined_file: Option<PathBuf>,
    #[serde(default)]
    git: Option<GitPublish>,
    #[serde(default)]
    local_path: Option<PathBuf>,
    #[serde(default)]
    remote_path: Option<String>,
}

impl From<SyncConfigFile> for SyncConfig {
    fn from(raw: SyncConfigFile) -> Self {
        let mut sources = raw.sources;
        if let (Some(local_path), Some(remote_path)) = (raw.local_path, raw.remote_path) {
            let name = legacy_source_name(&remote_path);
            sources.push(SyncSource {
                name,
                local_path,
                remote_path,
            });
        }
        Self {
            mode: raw.mode,
            host: raw.host,
            username: raw.username,
            private_key_path: raw.private_key_path,
            keep_recent: raw.keep_recent,
            sources,
            combined_file: raw.combined_file,
            git: raw.git,
        }
    }
}

/// Last `/`-separated segment of the destination, e.g. `/data/ftimes` -> `ftimes`.
fn legacy_source_name(remote_path: &str) -> String {
    remote_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("default")
        .to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::Local,
            host: String::new(),
            username: String::new(),
            private_key_path: String::new(),
            keep_recent: DEFAULT_KEEP_RECENT,
            sources: vec![SyncSource {
                name: "ftimes".into(),
                local_path: PathBuf::from("ftimes"),
                remote_path: "/data/ftimes".into(),
            }],
            combined_file: None,
            git: None,
        }
    }
}

impl SyncConfig {
    /// Load from JSON (default) or TOML (by `.toml` extension).
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no sync config; using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sync config from {}", path.display()))?;
        let cfg = if is_toml(path) {
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        } else {
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        };
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = if is_toml(path) {
            toml::to_string_pretty(self).context("serializing sync config")?
        } else {
            serde_json::to_string_pretty(self).context("serializing sync config")?
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }

    pub fn remote_ready(&self) -> bool {
        [&self.host, &self.username, &self.private_key_path]
            .iter()
            .all(|s| !s.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("no sources configured; add `sources` to the sync config");
        }
        if self.keep_recent == 0 {
            bail!("keep_recent must be at least 1");
        }
        if self.mode == SyncMode::Remote && !self.remote_ready() {
            bail!("remote sync needs host, username and private_key_path; run `sync-articles configure`");
        }
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}
