// src/summary.rs
//! Summary aggregation across configured source directories.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::folders::resolve_latest;

/// File looked up inside each latest dated folder.
pub const SUMMARY_FILE_NAME: &str = "article_summary.txt";

/// Joins summaries from different sources. Consumers split on the `=` run,
/// so this must stay byte-identical.
pub const SEPARATOR: &str = "\n\n================================================================================\n\n";

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("summary file {} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
}

/// Read `article_summary.txt` from a dated folder.
///
/// Missing or unreadable files and whitespace-only content all count as
/// "no summary". Only a file that cannot be decoded as UTF-8 is an error.
pub fn read_summary(folder: &Path) -> Result<Option<String>, SummaryError> {
    let path = folder.join(SUMMARY_FILE_NAME);
    match fs::read_to_string(&path) {
        Ok(text) if text.trim().is_empty() => {
            debug!(path = %path.display(), "summary file is blank");
            Ok(None)
        }
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(SummaryError::Encoding { path }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read summary file");
            Ok(None)
        }
    }
}

/// Concatenate the latest summary of every source, in the given order.
///
/// Returns `Ok(None)` when no source contributed anything, which is distinct
/// from an empty string.
pub fn aggregate<P: AsRef<Path>>(base_dirs: &[P]) -> Result<Option<String>, SummaryError> {
    let mut parts = Vec::with_capacity(base_dirs.len());
    for base in base_dirs {
        let Some(folder) = resolve_latest(base.as_ref()) else {
            continue;
        };
        if let Some(text) = read_summary(&folder)? {
            parts.push(text);
        }
    }
    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(parts.join(SEPARATOR)))
}

/// The single most recent dated folder across all sources.
///
/// Candidates are ranked by their folder name only, so the length of a
/// source's own path never influences the result. On equal names the
/// earlier source wins.
pub fn latest_across<P: AsRef<Path>>(base_dirs: &[P]) -> Option<PathBuf> {
    let mut best: Option<PathBuf> = None;
    for base in base_dirs {
        let Some(candidate) = resolve_latest(base.as_ref()) else {
            continue;
        };
        let newer = match &best {
            None => true,
            Some(current) => folder_name(&candidate) > folder_name(current),
        };
        if newer {
            best = Some(candidate);
        }
    }
    best
}

fn folder_name(path: &Path) -> &OsStr {
    path.file_name().unwrap_or_default()
}
