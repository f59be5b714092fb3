// src/sync/mod.rs
//! Mirrors the most recent dated folders' summary files from each source into
//! the directories the server reads, then optionally publishes the combined file.

pub mod config;
pub mod publish;
pub mod transport;

use anyhow::{Context, Result};
use metrics::counter;
use std::path::Path;
use tracing::info;

use crate::folders::dated_folder_names;
use crate::metrics::SYNC_FILES_TOTAL;
use crate::summary::SUMMARY_FILE_NAME;

use self::config::{SyncConfig, SyncMode, SyncSource};
use self::publish::{write_combined, GitPublisher};
use self::transport::{join_dest, LocalTransport, ScpTransport, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub source: String,
    /// Folders considered, oldest first.
    pub folders: Vec<String>,
    pub copied: usize,
    /// Folders without a summary file.
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<SyncReport>,
    pub combined_written: bool,
    pub published: bool,
}

/// The `keep` newest dated folders under `local_dir`, oldest first.
pub fn recent_folders(local_dir: &Path, keep: usize) -> Result<Vec<String>> {
    let mut names = dated_folder_names(local_dir)
        .with_context(|| format!("listing {}", local_dir.display()))?;
    let start = names.len().saturating_sub(keep);
    Ok(names.split_off(start))
}

/// Copy `article_summary.txt` of each recent folder to `<remote_path>/<folder>/`.
pub async fn sync_source<T>(transport: &T, source: &SyncSource, keep: usize) -> Result<SyncReport>
where
    T: Transport + ?Sized,
{
    transport
        .ensure_dir(&source.remote_path)
        .await
        .with_context(|| format!("preparing destination for '{}'", source.name))?;

    let folders = recent_folders(&source.local_path, keep)?;
    info!(source = %source.name, count = folders.len(), "recent folders to sync");

    let mut copied = 0usize;
    let mut skipped = 0usize;
    for folder in &folders {
        let dest_folder = join_dest(&source.remote_path, folder);
        transport.ensure_dir(&dest_folder).await?;

        let local_summary = source.local_path.join(folder).join(SUMMARY_FILE_NAME);
        if !local_summary.is_file() {
            skipped += 1;
            continue;
        }
        let dest_summary = join_dest(&dest_folder, SUMMARY_FILE_NAME);
        info!(
            transport = transport.name(),
            from = %local_summary.display(),
            to = %dest_summary,
            "syncing summary"
        );
        transport.put(&local_summary, &dest_summary).await?;
        counter!(SYNC_FILES_TOTAL).increment(1);
        copied += 1;
    }

    Ok(SyncReport {
        source: source.name.clone(),
        folders,
        copied,
        skipped,
    })
}

/// Pick the transport named by the config.
pub fn transport_for(config: &SyncConfig) -> Result<Box<dyn Transport>> {
    config.validate()?;
    Ok(match config.mode {
        SyncMode::Local => Box::new(LocalTransport),
        SyncMode::Remote => Box::new(ScpTransport::new(
            config.host.trim(),
            config.username.trim(),
            config.private_key_path.trim(),
        )),
    })
}

/// Sync every source in order, then write and publish the combined file when
/// configured. The first failing source aborts the run.
pub async fn run<T>(config: &SyncConfig, transport: &T) -> Result<RunSummary>
where
    T: Transport + ?Sized,
{
    config.validate()?;

    let mut summary = RunSummary::default();
    for source in &config.sources {
        let report = sync_source(transport, source, config.keep_recent).await?;
        summary.reports.push(report);
    }

    let Some(out) = &config.combined_file else {
        return Ok(summary);
    };
    let locals: Vec<&Path> = config.sources.iter().map(|s| s.local_path.as_path()).collect();
    summary.combined_written = write_combined(&locals, out)?;

    if let (true, Some(git)) = (summary.combined_written, &config.git) {
        let message = format!(
            "Update article summaries {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        );
        summary.published = GitPublisher::from(git)
            .commit_and_push(out, &message)
            .await?;
    }
    Ok(summary)
}
