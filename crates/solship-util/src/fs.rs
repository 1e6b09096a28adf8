//! Filesystem utilities for solship.

use std::path::Path;

use crate::error::UtilError;

/// What to do when a copy destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Remove the existing destination before copying.
    #[default]
    Replace,
    /// Refuse to copy and return `UtilError::DestinationExists`.
    Fail,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> UtilError + '_ {
    move |source| UtilError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Create a directory and all parent directories if they do not exist.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), UtilError> {
    std::fs::create_dir_all(path).map_err(io_err(path))
}

/// Remove a file, symlink, or directory tree. No error if nothing is there.
///
/// # Errors
/// Returns an error if the path exists but cannot be removed.
pub fn remove_path_if_exists(path: &Path) -> Result<(), UtilError> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(io_err(path)(source)),
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path).map_err(io_err(path))
    } else {
        std::fs::remove_file(path).map_err(io_err(path))
    }
}

/// Make way for a new `dest` according to `policy`.
///
/// # Errors
/// Returns `UtilError::DestinationExists` under `ConflictPolicy::Fail` when
/// something is already at `dest`, or an I/O error if it cannot be removed.
pub fn clear_destination(dest: &Path, policy: ConflictPolicy) -> Result<(), UtilError> {
    if std::fs::symlink_metadata(dest).is_err() {
        return Ok(());
    }
    match policy {
        ConflictPolicy::Replace => {
            tracing::debug!(path = %dest.display(), "replacing existing destination");
            remove_path_if_exists(dest)
        }
        ConflictPolicy::Fail => Err(UtilError::DestinationExists {
            path: dest.display().to_string(),
        }),
    }
}

/// Whether `src` and `dest` name the same existing filesystem entry.
fn same_location(src: &Path, dest: &Path) -> bool {
    match (std::fs::canonicalize(src), std::fs::canonicalize(dest)) {
        (Ok(src), Ok(dest)) => src == dest,
        _ => false,
    }
}

/// Copy a single file to `dest`, creating parent directories as needed.
///
/// Nothing is copied when `src` already is `dest`.
///
/// # Errors
/// Returns an error if the destination exists under `ConflictPolicy::Fail`,
/// or if the copy fails.
pub fn copy_file(src: &Path, dest: &Path, policy: ConflictPolicy) -> Result<(), UtilError> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    if same_location(src, dest) {
        tracing::debug!(path = %dest.display(), "already in place");
        return Ok(());
    }
    clear_destination(dest, policy)?;
    std::fs::copy(src, dest).map_err(io_err(dest))?;
    Ok(())
}

/// Recursively copy the directory `src` to `dest` (which becomes the copy of `src`).
///
/// Symlinks inside the tree are recreated as symlinks on Unix; bundles such as
/// `.app` and `.xcarchive` rely on them. Nothing is copied when `src`
/// already is `dest`.
///
/// # Errors
/// Returns an error if the destination exists under `ConflictPolicy::Fail`,
/// `src` is not a readable directory, or any entry fails to copy.
pub fn copy_dir(src: &Path, dest: &Path, policy: ConflictPolicy) -> Result<(), UtilError> {
    if !src.is_dir() {
        return Err(UtilError::Io {
            path: src.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    if same_location(src, dest) {
        tracing::debug!(path = %dest.display(), "already in place");
        return Ok(());
    }
    clear_destination(dest, policy)?;
    copy_dir_recursive(src, dest)
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<(), UtilError> {
    ensure_dir(dest)?;

    let entries = std::fs::read_dir(src).map_err(io_err(src))?;
    for entry in entries {
        let entry = entry.map_err(io_err(src))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(io_err(&from))?;

        if file_type.is_symlink() {
            copy_symlink(&from, &to)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            std::fs::copy(&from, &to).map_err(io_err(&to))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), UtilError> {
    let target = std::fs::read_link(from).map_err(io_err(from))?;
    std::os::unix::fs::symlink(&target, to).map_err(io_err(to))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), UtilError> {
    if from.is_dir() {
        copy_dir_recursive(from, to)
    } else {
        std::fs::copy(from, to).map(|_| ()).map_err(io_err(to))
    }
}

/// Derive the `n`-th alternative of a file name by inserting `-n` before its extension.
///
/// A trailing `.zip` wraps the bundle's own extension, so both stay together:
/// `("App.dSYM.zip", 2)` becomes `"App-2.dSYM.zip"` and
/// `("com.app-Signed.apk", 2)` becomes `"com.app-Signed-2.apk"`. Names
/// without an extension (or dot-files) get the suffix appended.
pub fn numbered_file_name(name: &str, n: usize) -> String {
    let (base, wrapper) = match name.strip_suffix(".zip") {
        Some(base) if !base.is_empty() => (base, ".zip"),
        _ => (name, ""),
    };
    match base.rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, ext) = base.split_at(dot);
            format!("{stem}-{n}{ext}{wrapper}")
        }
        _ => format!("{base}-{n}{wrapper}"),
    }
}
