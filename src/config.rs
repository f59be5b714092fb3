// src/config.rs
//! Service configuration: built once at startup, then shared read-only.
//!
//! Resolution order (later wins):
//! 1) built-in defaults (depend on [`Environment`])
//! 2) TOML file: $SUMMARY_CONFIG_PATH, else `config/server.toml` when present
//! 3) environment variables: APP_ENV, PORT, FRONTEND_DIR, SUMMARY_SOURCES,
//!    METRICS_ENABLED

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CONFIG_PATH: &str = "config/server.toml";
pub const DEFAULT_FRONTEND_DIR: &str = "frontend";

pub const ENV_CONFIG_PATH: &str = "SUMMARY_CONFIG_PATH";
pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_PORT: &str = "PORT";
pub const ENV_FRONTEND_DIR: &str = "FRONTEND_DIR";
pub const ENV_SOURCES: &str = "SUMMARY_SOURCES";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" | "local" => Some(Self::Development),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

/// One content provider's root directory holding dated subfolders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDir {
    pub name: String,
    pub path: PathBuf,
}

impl SourceDir {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub sources: Vec<SourceDir>,
    pub frontend_dir: PathBuf,
    /// Serve Prometheus metrics on `/metrics`.
    pub metrics_enabled: bool,
}

/// On-disk shape of `config/server.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    environment: Option<String>,
    port: Option<u16>,
    frontend_dir: Option<PathBuf>,
    sources: Option<Vec<SourceDir>>,
    metrics_enabled: Option<bool>,
}

impl AppConfig {
    /// Defaults for the given environment, relative to `cwd`.
    ///
    /// Production deployments run from a `backend/` checkout with data one
    /// level up; development keeps data next to the working directory.
    pub fn defaults(environment: Environment, cwd: &Path) -> Self {
        let data = match environment {
            Environment::Production => cwd.join("..").join("data"),
            Environment::Development => cwd.join("data"),
        };
        Self {
            environment,
            port: DEFAULT_PORT,
            sources: vec![SourceDir::new("data", data)],
            frontend_dir: PathBuf::from(DEFAULT_FRONTEND_DIR),
            metrics_enabled: false,
        }
    }

    /// Build from the process environment (after loading `.env` if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let cwd = std::env::current_dir().context("resolving working directory")?;
        Self::from_vars(&cwd, |k| std::env::var(k).ok())
    }

    /// Pure constructor: `lookup` answers variable names, `cwd` anchors defaults.
    pub fn from_vars<F>(cwd: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = load_file_config(cwd, &lookup)?;

        let env_raw = lookup(ENV_APP_ENV).or_else(|| file.environment.clone());
        let environment = match env_raw {
            Some(raw) => Environment::parse(&raw)
                .ok_or_else(|| anyhow!("unknown environment '{raw}' (expected production|development)"))?,
            None => Environment::default(),
        };

        let mut cfg = Self::defaults(environment, cwd);

        if let Some(port) = file.port {
            cfg.port = port;
        }
        if let Some(dir) = file.frontend_dir {
            cfg.frontend_dir = dir;
        }
        if let Some(sources) = file.sources {
            cfg.sources = sources;
        }
        if let Some(enabled) = file.metrics_enabled {
            cfg.metrics_enabled = enabled;
        }

        if let Some(raw) = lookup(ENV_PORT) {
            cfg.port = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PORT} is not a valid port: '{raw}'"))?;
        }
        if let Some(dir) = lookup(ENV_FRONTEND_DIR).filter(|s| !s.trim().is_empty()) {
            cfg.frontend_dir = PathBuf::from(dir.trim());
        }
        if let Some(raw) = lookup(ENV_SOURCES) {
            let sources = parse_sources(&raw);
            if !sources.is_empty() {
                cfg.sources = sources;
            }
        }
        if let Some(raw) = lookup(ENV_METRICS_ENABLED) {
            cfg.metrics_enabled = parse_flag(&raw)
                .ok_or_else(|| anyhow!("{ENV_METRICS_ENABLED} is not a boolean: '{raw}'"))?;
        }

        Ok(cfg)
    }

    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| s.path.clone()).collect()
    }
}

fn load_file_config<F>(cwd: &Path, lookup: &F) -> Result<FileConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let path = match lookup(ENV_CONFIG_PATH) {
        Some(p) => {
            let pb = cwd.join(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            pb
        }
        None => {
            let pb = cwd.join(DEFAULT_CONFIG_PATH);
            if !pb.exists() {
                return Ok(FileConfig::default());
            }
            pb
        }
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("reading server config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing server config {}", path.display()))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `name=path,other=/abs/path,plain/path`. A bare path takes its last
/// component as name. Blank entries are dropped.
pub fn parse_sources(raw: &str) -> Vec<SourceDir> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, path)) => SourceDir::new(name.trim(), path.trim()),
            None => {
                let path = PathBuf::from(entry);
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| entry.to_string());
                SourceDir::new(name, path)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_depend_on_environment() {
        let cwd = Path::new("/srv/app/backend");
        let prod = AppConfig::defaults(Environment::Production, cwd);
        assert_eq!(prod.sources[0].path, cwd.join("..").join("data"));
        let dev = AppConfig::defaults(Environment::Development, cwd);
        assert_eq!(dev.sources[0].path, cwd.join("data"));
        assert_eq!(prod.port, DEFAULT_PORT);
    }

    #[test]
    fn env_overrides_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = AppConfig::from_vars(
            tmp.path(),
            vars(&[
                (ENV_APP_ENV, "dev"),
                (ENV_PORT, "9090"),
                (ENV_SOURCES, "ft=/data/ftimes, /data/economist ,,"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.port, 9090);
        assert_eq!(
            cfg.sources,
            vec![
                SourceDir::new("ft", "/data/ftimes"),
                SourceDir::new("economist", "/data/economist"),
            ]
        );
    }

    #[test]
    fn bad_port_and_env_are_errors() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(AppConfig::from_vars(tmp.path(), vars(&[(ENV_PORT, "eighty")])).is_err());
        assert!(AppConfig::from_vars(tmp.path(), vars(&[(ENV_APP_ENV, "staging")])).is_err());
    }

    #[test]
    fn toml_file_is_layered_under_env() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join(DEFAULT_CONFIG_PATH),
            r#"
environment = "development"
port = 7000
frontend_dir = "web"

[[sources]]
name = "ftimes"
path = "/data/ftimes"
"#,
        )
        .unwrap();

        let cfg = AppConfig::from_vars(tmp.path(), vars(&[(ENV_PORT, "7001")])).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.port, 7001);
        assert_eq!(cfg.frontend_dir, PathBuf::from("web"));
        assert_eq!(cfg.sources, vec![SourceDir::new("ftimes", "/data/ftimes")]);
    }

    #[test]
    fn metrics_flag_from_file_and_env() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = AppConfig::from_vars(tmp.path(), vars(&[])).unwrap();
        assert!(!cfg.metrics_enabled);

        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(tmp.path().join(DEFAULT_CONFIG_PATH), "metrics_enabled = true\n").unwrap();
        let cfg = AppConfig::from_vars(tmp.path(), vars(&[])).unwrap();
        assert!(cfg.metrics_enabled);

        let cfg = AppConfig::from_vars(tmp.path(), vars(&[(ENV_METRICS_ENABLED, "0")])).unwrap();
        assert!(!cfg.metrics_enabled);
        let cfg = AppConfig::from_vars(tmp.path(), vars(&[(ENV_METRICS_ENABLED, " TRUE ")])).unwrap();
        assert!(cfg.metrics_enabled);
        assert!(AppConfig::from_vars(tmp.path(), vars(&[(ENV_METRICS_ENABLED, "maybe")])).is_err());
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let err = AppConfig::from_vars(tmp.path(), vars(&[(ENV_CONFIG_PATH, "missing.toml")]))
            .unwrap_err();
        assert!(err.to_string().contains("non-existent"));
    }
}
