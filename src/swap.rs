//! Filesystem publish: unique naming, backup, and the rename sequence.
//!
//! Publishing never overwrites anything it did not create. The rendered
//! text is staged under a collision-free sibling name, the pre-run
//! destination is either deleted or renamed to a collision-free
//! `<stem>_OLD<ext>` backup, and the staged file is renamed onto the
//! destination path:
//!
//! 1. stage: write rendered text to a unique sibling;
//! 2. retire: delete the old destination, or rename it to the backup name;
//! 3. swap: rename the staged file onto the destination path.
//!
//! The sequence is not transactional. A failure between steps can leave a
//! staged file behind, and the destination path is briefly absent between
//! steps 2 and 3; a retry picks fresh unique names and never clobbers the
//! leftovers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::GraftResult;

// ============================================================================
// Unique naming
// ============================================================================

/// Pick a file name that collides (case-insensitively) with nothing in
/// `existing`.
///
/// Returns `desired` unchanged when it is already free; otherwise appends
/// `_N` before the extension, trying N = 0, 1, 2, ... until a free name is
/// found.
pub fn unique_name(existing: &[String], desired: &str) -> String {
    let collides = |name: &str| {
        let target = name.to_lowercase();
        existing.iter().any(|e| e.to_lowercase() == target)
    };

    if !collides(desired) {
        return desired.to_string();
    }

    let (stem, ext) = split_name(desired);
    let mut n = 0usize;
    loop {
        let attempt = format!("{stem}_{n}{ext}");
        if !collides(&attempt) {
            return attempt;
        }
        n += 1;
    }
}

/// Split a file name into stem and extension-with-dot.
///
/// The extension starts at the last dot, except that dots leading a name
/// never open an extension: `"a.py"` -> `("a", ".py")`,
/// `"archive.tar.gz"` -> `("archive.tar", ".gz")`, `".env"` ->
/// `(".env", "")`.
fn split_name(name: &str) -> (&str, &str) {
    if let Some(idx) = name.rfind('.') {
        if name[..idx].chars().any(|c| c != '.') {
            return name.split_at(idx);
        }
    }
    (name, "")
}

/// Compute a collision-free path for `path` among its directory siblings.
///
/// Only regular files are considered for collisions, matching the publish
/// sequence's needs; the returned path is not created.
pub fn unique_sibling(path: &Path) -> GraftResult<PathBuf> {
    let dir = parent_dir(path);
    let desired = file_name_of(path)?;
    let names = sibling_file_names(&dir)?;
    Ok(dir.join(unique_name(&names, &desired)))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn file_name_of(path: &Path) -> GraftResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path has no file name: {}", path.display()),
            )
            .into()
        })
}

fn sibling_file_names(dir: &Path) -> GraftResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(names)
}

// ============================================================================
// Publish
// ============================================================================

/// What the publish sequence left on disk.
#[derive(Debug)]
pub struct PublishOutcome {
    /// The destination path, now holding the rendered text.
    pub destination: PathBuf,
    /// Backup holding the pre-run destination content, unless delete-old
    /// was requested.
    pub backup: Option<PathBuf>,
}

/// Publish `rendered` as the new content of `dest`.
///
/// With `delete_old` false (the default mode), the pre-run destination
/// survives as a uniquely-named `<stem>_OLD<ext>` sibling.
pub fn publish(dest: &Path, rendered: &str, delete_old: bool) -> GraftResult<PublishOutcome> {
    if !dest.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("destination vanished before publish: {}", dest.display()),
        )
        .into());
    }

    let staged = unique_sibling(dest)?;
    fs::write(&staged, rendered)?;
    debug!(staged = %staged.display(), bytes = rendered.len(), "staged rendered destination");

    let backup = if delete_old {
        fs::remove_file(dest)?;
        None
    } else {
        let name = file_name_of(dest)?;
        let (stem, ext) = split_name(&name);
        let backup_path = unique_sibling(&parent_dir(dest).join(format!("{stem}_OLD{ext}")))?;
        fs::rename(dest, &backup_path)?;
        Some(backup_path)
    };

    fs::rename(&staged, dest)?;
    match &backup {
        Some(path) => {
            info!(dest = %dest.display(), backup = %path.display(), "published destination")
        }
        None => info!(dest = %dest.display(), "published destination, old file deleted"),
    }

    Ok(PublishOutcome {
        destination: dest.to_path_buf(),
        backup,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    mod unique_names {
        use super::*;

        #[test]
        fn free_name_is_returned_unchanged() {
            assert_eq!(unique_name(&strings(&["b.py"]), "a.py"), "a.py");
            assert_eq!(unique_name(&[], "a.py"), "a.py");
        }

        #[test]
        fn collision_appends_zero_before_extension() {
            assert_eq!(unique_name(&strings(&["a.py"]), "a.py"), "a_0.py");
        }

        #[test]
        fn suffix_increments_until_free() {
            assert_eq!(
                unique_name(&strings(&["a.py", "a_0.py"]), "a.py"),
                "a_1.py"
            );
            assert_eq!(
                unique_name(&strings(&["a.py", "a_0.py", "a_1.py", "a_2.py"]), "a.py"),
                "a_3.py"
            );
        }

        #[test]
        fn comparison_is_case_insensitive() {
            assert_eq!(unique_name(&strings(&["A.PY"]), "a.py"), "a_0.py");
            assert_eq!(unique_name(&strings(&["a.py", "A_0.py"]), "a.py"), "a_1.py");
        }

        #[test]
        fn names_without_extension_get_plain_suffix() {
            assert_eq!(unique_name(&strings(&["Makefile"]), "Makefile"), "Makefile_0");
        }

        #[test]
        fn leading_dot_is_not_an_extension() {
            assert_eq!(unique_name(&strings(&[".env"]), ".env"), ".env_0");
        }

        #[test]
        fn only_the_last_extension_is_preserved() {
            assert_eq!(
                unique_name(&strings(&["archive.tar.gz"]), "archive.tar.gz"),
                "archive.tar_0.gz"
            );
        }
    }

    mod unique_siblings {
        use super::*;

        #[test]
        fn scans_only_existing_files() {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("a.py"), "x").unwrap();
            fs::write(dir.path().join("a_0.py"), "x").unwrap();
            fs::create_dir(dir.path().join("a_1.py")).unwrap();

            let sibling = unique_sibling(&dir.path().join("a.py")).unwrap();
            // The directory named a_1.py does not count as a collision.
            assert_eq!(sibling, dir.path().join("a_1.py"));
        }

        #[test]
        fn fresh_name_passes_through() {
            let dir = TempDir::new().unwrap();
            let sibling = unique_sibling(&dir.path().join("new.py")).unwrap();
            assert_eq!(sibling, dir.path().join("new.py"));
        }
    }

    mod publishing {
        use super::*;

        fn listing(dir: &Path) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect();
            names.sort();
            names
        }

        #[test]
        fn default_mode_keeps_backup() {
            let dir = TempDir::new().unwrap();
            let dest = dir.path().join("dest.py");
            fs::write(&dest, "old content\n").unwrap();

            let outcome = publish(&dest, "new content\n", false).unwrap();

            assert_eq!(fs::read_to_string(&dest).unwrap(), "new content\n");
            let backup = outcome.backup.expect("default mode keeps a backup");
            assert_eq!(backup, dir.path().join("dest_OLD.py"));
            assert_eq!(fs::read_to_string(&backup).unwrap(), "old content\n");
            assert_eq!(listing(dir.path()), ["dest.py", "dest_OLD.py"]);
        }

        #[test]
        fn delete_old_leaves_no_backup() {
            let dir = TempDir::new().unwrap();
            let dest = dir.path().join("dest.py");
            fs::write(&dest, "old content\n").unwrap();

            let outcome = publish(&dest, "new content\n", true).unwrap();

            assert_eq!(fs::read_to_string(&dest).unwrap(), "new content\n");
            assert!(outcome.backup.is_none());
            assert_eq!(listing(dir.path()), ["dest.py"]);
        }

        #[test]
        fn backup_name_is_uniquified_when_taken() {
            let dir = TempDir::new().unwrap();
            let dest = dir.path().join("dest.py");
            fs::write(&dest, "old\n").unwrap();
            fs::write(dir.path().join("dest_OLD.py"), "older backup\n").unwrap();

            let outcome = publish(&dest, "new\n", false).unwrap();

            let backup = outcome.backup.unwrap();
            assert_eq!(backup, dir.path().join("dest_OLD_0.py"));
            assert_eq!(fs::read_to_string(&backup).unwrap(), "old\n");
            assert_eq!(
                fs::read_to_string(dir.path().join("dest_OLD.py")).unwrap(),
                "older backup\n"
            );
        }

        #[test]
        fn missing_destination_fails_loudly() {
            let dir = TempDir::new().unwrap();
            let dest = dir.path().join("never_written.py");
            let err = publish(&dest, "text\n", false).unwrap_err();
            assert_eq!(err.error_code().code(), 4);
            // Nothing was staged or renamed.
            assert!(listing(dir.path()).is_empty());
        }
    }
}
