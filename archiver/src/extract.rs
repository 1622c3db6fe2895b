//! Extraction of downloaded dist archives.
//!
//! Archives are unpacked with path traversal protection. Dists usually wrap
//! their files in one top-level directory; when that is all an archive holds,
//! its contents are moved up so the checkout root is the package root.

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path};

/// Archive formats a dist can be unpacked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistArchive {
    /// Zip archive.
    Zip,
    /// Plain tar.
    Tar,
    /// Gzip-compressed tar.
    TarGz,
}

impl DistArchive {
    /// Archive kind for a dist type, falling back to the file name.
    #[must_use]
    pub fn detect(dist_type: &str, filename: &str) -> Option<Self> {
        match dist_type {
            "zip" => Some(Self::Zip),
            "tar" => Some(Self::Tar),
            "tar.gz" | "tgz" => Some(Self::TarGz),
            _ if filename.ends_with(".zip") => Some(Self::Zip),
            _ if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") => Some(Self::TarGz),
            _ if filename.ends_with(".tar") => Some(Self::Tar),
            _ => None,
        }
    }
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The zip container is malformed.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Unpack `archive_path` into `dest_dir` and hoist a lone top-level
/// directory.
///
/// # Errors
///
/// Returns [`ExtractionError::PathTraversal`] if any entry would escape
/// `dest_dir`, [`ExtractionError::EmptyArchive`] if nothing was extracted,
/// and I/O or container errors otherwise.
pub fn extract(kind: DistArchive, archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractionError> {
    fs::create_dir_all(dest_dir)?;
    let file = fs::File::open(archive_path)?;
    let extracted = match kind {
        DistArchive::Zip => extract_zip(file, dest_dir)?,
        DistArchive::Tar => extract_tar(file, dest_dir)?,
        DistArchive::TarGz => extract_tar(flate2::read::GzDecoder::new(file), dest_dir)?,
    };
    if extracted == 0 {
        return Err(ExtractionError::EmptyArchive);
    }
    hoist_single_directory(dest_dir)?;
    Ok(())
}

fn extract_zip(file: fs::File, dest_dir: &Path) -> Result<usize, ExtractionError> {
    let mut archive = zip::ZipArchive::new(file)?;
    let mut extracted = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            });
        };
        let dest_path = dest_dir.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = fs::File::create(&dest_path)?;
        io::copy(&mut entry, &mut output)?;
        extracted += 1;
    }
    Ok(extracted)
}

fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<usize, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted = 0;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        entry.unpack(&dest_path)?;
        if entry.header().entry_type().is_file() {
            extracted += 1;
        }
    }
    Ok(extracted)
}

/// Validate that an entry path does not escape the destination directory
/// via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_) | Component::RootDir));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

fn hoist_single_directory(dest_dir: &Path) -> io::Result<()> {
    let entries: Vec<fs::DirEntry> = fs::read_dir(dest_dir)?.collect::<io::Result<_>>()?;
    let [only] = entries.as_slice() else {
        return Ok(());
    };
    if !only.file_type()?.is_dir() {
        return Ok(());
    }

    let nested = only.path();
    let staging = dest_dir.join(format!(".hoist-{:016x}", rand::random::<u64>()));
    fs::rename(&nested, &staging)?;
    for child in fs::read_dir(&staging)? {
        let child = child?;
        fs::rename(child.path(), dest_dir.join(child.file_name()))?;
    }
    fs::remove_dir(&staging)
}
