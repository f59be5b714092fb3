// src/folders.rs
//! Dated folder discovery: a source directory holds one subfolder per run,
//! named with a sortable date prefix (`2024-01-31`, `20240131_run2`, ...).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A child name qualifies as a dated folder when it starts with an ASCII digit.
/// No date validation happens here; `123abc` qualifies too.
pub fn is_dated_name(name: &str) -> bool {
    name.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

/// Digit-leading child directories of `base`, sorted ascending byte-wise.
///
/// Symlinks pointing at directories count. Names that are not valid UTF-8
/// are skipped.
pub fn dated_folder_names(base: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_dated_name(&name) && entry.path().is_dir() {
            names.push(name);
        }
    }
    names.sort_unstable();
    Ok(names)
}

/// Latest dated folder under `base`, or `None`.
///
/// A missing base directory is a normal outcome. Access errors are logged and
/// reported as `None`, so callers cannot tell "absent" from "unreadable".
pub fn resolve_latest(base: &Path) -> Option<PathBuf> {
    if !base.is_dir() {
        debug!(base = %base.display(), "source directory missing");
        return None;
    }
    match dated_folder_names(base) {
        Ok(names) => {
            let latest = names.into_iter().max()?;
            Some(base.join(latest))
        }
        Err(e) => {
            warn!(base = %base.display(), error = %e, "cannot list source directory");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mkdirs(base: &Path, names: &[&str]) {
        for n in names {
            fs::create_dir_all(base.join(n)).unwrap();
        }
    }

    #[test]
    fn digit_prefix_rule() {
        assert!(is_dated_name("2024-01-01"));
        assert!(is_dated_name("9"));
        assert!(is_dated_name("123abc"));
        assert!(!is_dated_name("abc"));
        assert!(!is_dated_name(""));
        assert!(!is_dated_name("_2024"));
        // non-ASCII digits do not count
        assert!(!is_dated_name("٢٠٢٤"));
    }

    #[test]
    fn picks_lexicographic_max_and_ignores_non_dated() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(tmp.path(), &["2023-01-01", "2023-02-15", "abc"]);

        let latest = resolve_latest(tmp.path()).unwrap();
        assert_eq!(latest, tmp.path().join("2023-02-15"));
    }

    #[test]
    fn plain_files_are_not_folders() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(tmp.path(), &["2023-01-01"]);
        fs::write(tmp.path().join("2099-12-31"), "not a dir").unwrap();

        let latest = resolve_latest(tmp.path()).unwrap();
        assert_eq!(latest, tmp.path().join("2023-01-01"));
    }

    #[test]
    fn missing_or_empty_base_yields_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(resolve_latest(&tmp.path().join("nope")).is_none());

        mkdirs(tmp.path(), &["notes", "archive"]);
        assert!(resolve_latest(tmp.path()).is_none());
    }

    #[test]
    fn names_compare_as_raw_text() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(tmp.path(), &["9", "10", "2024-05-01"]);

        // "9" > "2024-05-01" > "10" byte-wise
        assert_eq!(resolve_latest(tmp.path()).unwrap(), tmp.path().join("9"));
        assert_eq!(
            dated_folder_names(tmp.path()).unwrap(),
            vec!["10".to_string(), "2024-05-01".into(), "9".into()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn unlistable_base_yields_none() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("locked");
        mkdirs(&base, &["2024-01-01"]);
        fs::set_permissions(&base, fs::Permissions::from_mode(0o000)).unwrap();

        // privileged users can still list the directory; nothing to check then
        if fs::read_dir(&base).is_err() {
            assert!(resolve_latest(&base).is_none());
        }
        fs::set_permissions(&base, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
