//! Archive backend: turns a package's source into an archive file.
//!
//! The producer only talks to the [`ArchiveBackend`] trait. Archiving is two
//! steps so the pre-archive hook can run in between: [`ArchiveBackend::prepare`]
//! either finds the finished archive already in place or checks the package
//! out into a scratch directory, and [`ArchiveBackend::dump`] writes that
//! checkout into the target directory and removes it.

pub mod files;
pub mod naming;
pub mod writer;

use crate::download::PackageDownloader;
use crate::error::{ArchiveError, Result};
use crate::filesystem::{ensure_dir, partial_path, remove_dir, remove_file_if_exists};
use crate::format::ArchiveFormat;
use camino::{Utf8Path, Utf8PathBuf};
use satis::Package;
use std::fs;

/// Result of [`ArchiveBackend::prepare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// The finished archive when `is_target`, otherwise the checkout.
    pub path: Utf8PathBuf,
    /// Whether `path` is the finished archive.
    pub is_target: bool,
}

impl Prepared {
    /// A finished archive that can be reused.
    #[must_use]
    pub fn target(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_target: true,
        }
    }

    /// A checkout awaiting [`ArchiveBackend::dump`].
    #[must_use]
    pub fn checkout(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_target: false,
        }
    }
}

/// Creates archives from packages.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveBackend {
    /// The archive file name for `package`, without extension.
    fn filename(&self, package: &Package) -> String;

    /// Locate a reusable archive in `target_dir` or fetch the package's
    /// source into a fresh checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be fetched.
    fn prepare(
        &self,
        package: &Package,
        format: ArchiveFormat,
        target_dir: &Utf8Path,
    ) -> Result<Prepared>;

    /// Archive the checkout at `prepared` into `target_dir` and return the
    /// archive path. The checkout is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be written.
    fn dump(
        &self,
        package: &Package,
        format: ArchiveFormat,
        target_dir: &Utf8Path,
        prepared: &Utf8Path,
        ignore_filters: bool,
    ) -> Result<Utf8PathBuf>;
}

/// Archive backend that fetches with a [`PackageDownloader`] and writes
/// archives with [`writer::write_archive`].
pub struct ArchiveManager {
    downloader: Box<dyn PackageDownloader>,
    work_dir: Utf8PathBuf,
}

impl ArchiveManager {
    /// Backend checking packages out beneath `work_dir`.
    #[must_use]
    pub fn new(downloader: Box<dyn PackageDownloader>, work_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            downloader,
            work_dir: work_dir.into(),
        }
    }

    fn target_path(&self, package: &Package, format: ArchiveFormat, target_dir: &Utf8Path) -> Utf8PathBuf {
        target_dir.join(format!("{}.{}", self.filename(package), format.extension()))
    }

    fn write(
        &self,
        package: &Package,
        format: ArchiveFormat,
        target: &Utf8Path,
        checkout: &Utf8Path,
        ignore_filters: bool,
    ) -> Result<()> {
        let selected = files::archivable_files(checkout, package.archive_excludes(), ignore_filters)
            .map_err(|e| ArchiveError::filesystem(checkout, e))?;
        log::debug!("archiving {} file(s) of {}", selected.len(), package.id());

        let partial = partial_path(target);
        if let Err(e) = writer::write_archive(format, checkout, &selected, &partial) {
            remove_file_if_exists(&partial);
            return Err(ArchiveError::Backend {
                reason: format!("cannot write {format} archive {target}: {e}"),
            });
        }
        fs::rename(&partial, target).map_err(|e| {
            remove_file_if_exists(&partial);
            ArchiveError::filesystem(target, e)
        })
    }
}

impl ArchiveBackend for ArchiveManager {
    fn filename(&self, package: &Package) -> String {
        naming::package_filename(package)
    }

    fn prepare(
        &self,
        package: &Package,
        format: ArchiveFormat,
        target_dir: &Utf8Path,
    ) -> Result<Prepared> {
        let target = self.target_path(package, format, target_dir);
        if target.is_file() {
            return Ok(Prepared::target(target));
        }

        let checkout = self.work_dir.join(format!(
            "{}-{:016x}",
            self.filename(package),
            rand::random::<u64>()
        ));
        ensure_dir(&checkout)?;
        if let Err(e) = self.downloader.fetch(package, &checkout, false) {
            if let Err(cleanup) = remove_dir(&checkout) {
                log::warn!("{cleanup}");
            }
            return Err(e.into());
        }
        Ok(Prepared::checkout(checkout))
    }

    fn dump(
        &self,
        package: &Package,
        format: ArchiveFormat,
        target_dir: &Utf8Path,
        prepared: &Utf8Path,
        ignore_filters: bool,
    ) -> Result<Utf8PathBuf> {
        let target = self.target_path(package, format, target_dir);
        let written = ensure_dir(target_dir)
            .and_then(|()| self.write(package, format, &target, prepared, ignore_filters));
        let cleaned = remove_dir(prepared);
        written?;
        cleaned?;
        Ok(target)
    }
}
