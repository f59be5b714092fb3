// src/sync/transport.rs
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Destination side of a sync. Destination paths are `/`-separated strings so
/// the same layout works locally and on a remote host.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Create `dest` (and parents) if missing.
    async fn ensure_dir(&self, dest: &str) -> Result<()>;
    /// Copy one local file to `dest`, replacing what is there.
    async fn put(&self, local: &Path, dest: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Join a destination directory and a child name with `/`.
pub fn join_dest(base: &str, child: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return child.to_string();
    }
    format!("{base}/{child}")
}

/// Plain file copy on this machine.
#[derive(Debug, Default, Clone)]
pub struct LocalTransport;

#[async_trait::async_trait]
impl Transport for LocalTransport {
    async fn ensure_dir(&self, dest: &str) -> Result<()> {
        tokio::fs::create_dir_all(dest)
            .await
            .with_context(|| format!("creating directory {dest}"))
    }

    async fn put(&self, local: &Path, dest: &str) -> Result<()> {
        if let Some(parent) = Path::new(dest).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        tokio::fs::copy(local, dest)
            .await
            .with_context(|| format!("copying {} to {dest}", local.display()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Copies over `scp`, creating folders with `ssh mkdir -p`. Key-based auth only;
/// `BatchMode` keeps the processes from prompting.
#[derive(Debug, Clone)]
pub struct ScpTransport {
    host: String,
    username: String,
    private_key: PathBuf,
}

impl ScpTransport {
    pub fn new(host: impl Into<String>, username: impl Into<String>, private_key: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            private_key: private_key.into(),
        }
    }

    fn target(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }

    async fn run(&self, program: &str, args: &[String]) -> Result<()> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("spawning {program}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            bail!(
                "{program} {} failed: {}",
                args.join(" "),
                if stderr.is_empty() { "unknown error" } else { stderr.as_str() }
            );
        }
        Ok(())
    }

    fn auth_args(&self) -> Vec<String> {
        vec![
            "-i".into(),
            self.private_key.display().to_string(),
            "-o".into(),
            "BatchMode=yes".into(),
        ]
    }

    /// `ssh` arguments; the remote command goes through a shell, so `dest` is quoted.
    fn mkdir_args(&self, dest: &str) -> Vec<String> {
        let mut args = self.auth_args();
        args.push(self.target());
        args.push(format!("mkdir -p -- {}", shell_quote(dest)));
        args
    }

    /// `scp` arguments. Recent OpenSSH copies over SFTP where the remote path is
    /// taken literally, so `dest` is passed unquoted.
    fn put_args(&self, local: &Path, dest: &str) -> Vec<String> {
        let mut args = self.auth_args();
        args.push("-q".into());
        args.push(local.display().to_string());
        args.push(format!("{}:{dest}", self.target()));
        args
    }
}

/// Single-quote for the remote shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[async_trait::async_trait]
impl Transport for ScpTransport {
    async fn ensure_dir(&self, dest: &str) -> Result<()> {
        self.run("ssh", &self.mkdir_args(dest)).await
    }

    async fn put(&self, local: &Path, dest: &str) -> Result<()> {
        self.run("scp", &self.put_args(local, dest)).await
    }

    fn name(&self) -> &'static str {
        "scp"
    }
}
