// src/sync/publish.rs
//! Post-sync publishing: write the combined summary file and optionally
//! commit + push it with git.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

use super::config::GitPublish;
use crate::summary;

/// Write the aggregate of `sources` to `out`. Returns `false` (and leaves
/// `out` untouched) when no source has a summary.
pub fn write_combined<P: AsRef<Path>>(sources: &[P], out: &Path) -> Result<bool> {
    let Some(text) = summary::aggregate(sources)? else {
        info!(out = %out.display(), "no summaries to combine");
        return Ok(false);
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("writing {}", out.display()))?;
    Ok(true)
}

#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo_dir: PathBuf,
    remote: String,
    branch: Option<String>,
}

impl From<&GitPublish> for GitPublisher {
    fn from(cfg: &GitPublish) -> Self {
        Self {
            repo_dir: cfg.repo_dir.clone(),
            remote: cfg.remote.clone(),
            branch: cfg.branch.clone(),
        }
    }
}

impl GitPublisher {
    async fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .with_context(|| format!("spawning git {}", args.join(" ")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            bail!(
                "git {} failed: {}",
                args.join(" "),
                if stderr.is_empty() { "unknown error" } else { stderr.as_str() }
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Stage, commit and push `file`. Returns `false` when the file has no
    /// changes, in which case nothing is committed or pushed.
    pub async fn commit_and_push(&self, file: &Path, message: &str) -> Result<bool> {
        let file = file.to_string_lossy();
        self.git(&["add", "--", &file]).await?;

        let staged = self.git(&["status", "--porcelain", "--", &file]).await?;
        if staged.is_empty() {
            info!(file = %file, "combined file unchanged; skipping commit");
            return Ok(false);
        }

        self.git(&["commit", "-m", message, "--", &file]).await?;
        match &self.branch {
            Some(branch) => self.git(&["push", &self.remote, branch]).await?,
            None => self.git(&["push", &self.remote]).await?,
        };
        info!(file = %file, remote = %self.remote, "combined file pushed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{SEPARATOR, SUMMARY_FILE_NAME};

    #[test]
    fn combined_file_joins_sources_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        for (base, text) in [(&a, "first"), (&b, "second")] {
            std::fs::create_dir_all(base.join("2024-01-01")).unwrap();
            std::fs::write(base.join("2024-01-01").join(SUMMARY_FILE_NAME), text).unwrap();
        }
        let out = tmp.path().join("site/data/article_summary.txt");

        assert!(write_combined(&[&a, &b], &out).unwrap());
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            format!("first{SEPARATOR}second")
        );
    }

    #[test]
    fn nothing_to_combine_leaves_output_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("combined.txt");
        assert!(!write_combined(&[tmp.path().join("missing")], &out).unwrap());
        assert!(!out.exists());
    }
}
