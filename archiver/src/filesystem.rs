//! Filesystem helpers shared by the producer and the archive backend.
//!
//! Files only ever appear at their final path through a rename, so a reader of
//! the output tree never sees a half-written artefact.

use crate::error::{ArchiveError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use sha1::{Digest, Sha1};
use std::fs;
use std::io::Read;

/// Suffix for files still being written.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Create `dir` and any missing parents.
///
/// # Errors
///
/// Returns [`ArchiveError::Filesystem`] if creation fails.
pub fn ensure_dir(dir: &Utf8Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ArchiveError::filesystem(dir, e))
}

/// The sibling path a file is written to before it is published.
#[must_use]
pub fn partial_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut partial = path.as_str().to_owned();
    partial.push_str(PARTIAL_SUFFIX);
    Utf8PathBuf::from(partial)
}

/// Move `from` to `to`, creating `to`'s parent.
///
/// Tries a rename first. When that fails (typically across filesystems) the
/// file is copied to a partial sibling of `to`, renamed into place, and the
/// source removed.
///
/// # Errors
///
/// Returns [`ArchiveError::Filesystem`] if the file cannot be moved.
pub fn move_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let partial = partial_path(to);
    if let Err(e) = fs::copy(from, &partial) {
        remove_file_if_exists(&partial);
        return Err(ArchiveError::filesystem(from, e));
    }
    if let Err(e) = fs::rename(&partial, to) {
        remove_file_if_exists(&partial);
        return Err(ArchiveError::filesystem(to, e));
    }
    fs::remove_file(from).map_err(|e| ArchiveError::filesystem(from, e))
}

/// Remove `dir` recursively; a missing directory is not an error.
///
/// # Errors
///
/// Returns [`ArchiveError::Filesystem`] if removal fails.
pub fn remove_dir(dir: &Utf8Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ArchiveError::filesystem(dir, e)),
    }
}

/// Best-effort removal used on error paths.
pub fn remove_file_if_exists(path: &Utf8Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("failed to remove {path}: {e}");
        }
    }
}

/// Compute the lowercase hex SHA-1 digest of a file.
///
/// # Errors
///
/// Returns [`ArchiveError::Filesystem`] if the file cannot be read.
pub fn sha1_file(path: &Utf8Path) -> Result<String> {
    let mut file = fs::File::open(path).map_err(|e| ArchiveError::filesystem(path, e))?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ArchiveError::filesystem(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Convert a standard path into a UTF-8 path.
///
/// # Errors
///
/// Returns [`ArchiveError::Backend`] for non-UTF-8 paths.
pub fn utf8_path(path: &std::path::Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path.to_path_buf()).map_err(|e| ArchiveError::Backend {
        reason: format!("path is not valid UTF-8: {}", e.into_path_buf().display()),
    })
}
