//! Error types for the archive builder.
//!
//! [`ArchiveError`] describes why one package could not be archived; the
//! orchestrator wraps it with the package identity in [`BuildError`]. The
//! category only matters for logging: any per-package failure is either
//! fatal or skipped, depending on the skip-errors policy.

use crate::download::DownloadError;
use crate::hook::HookError;
use camino::{Utf8Path, Utf8PathBuf};
use satis::{ConfigError, PackageFileError, PackageId};
use thiserror::Error;

/// Errors that can occur while producing one package's archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Fetching the package's original distribution or source failed.
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    /// The archive backend could not prepare or write the archive.
    #[error("archive backend failed: {reason}")]
    Backend {
        /// Description of the failure.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// Path the operation touched.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A pre-archive hook failed.
    #[error("pre-archive hook failed: {0}")]
    Hook(#[from] HookError),
}

impl ArchiveError {
    /// Build a [`ArchiveError::Filesystem`] for `path`.
    #[must_use]
    pub fn filesystem(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_owned(),
            source,
        }
    }

    /// Short category name for log lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Download(_) => "download",
            Self::Backend { .. } => "archive backend",
            Self::Filesystem { .. } => "filesystem",
            Self::Hook(_) => "hook",
        }
    }
}

/// Errors that end a build run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The archive base directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A package failed and skip-errors is off.
    #[error("failed to archive {package}: {source}")]
    Package {
        /// The package that failed.
        package: PackageId,
        /// Why it failed.
        #[source]
        source: ArchiveError,
    },

    /// The run was cancelled from outside.
    #[error("build cancelled after {processed} package(s)")]
    Cancelled {
        /// Packages processed before cancellation was observed.
        processed: usize,
    },
}

/// Errors that end a `satis-archive` invocation.
#[derive(Debug, Error)]
pub enum CliError {
    /// `satis.json` could not be loaded or resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The packages file could not be read or written.
    #[error(transparent)]
    Packages(#[from] PackageFileError),

    /// The build stopped early.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Some packages failed under skip-errors; the rest were written.
    #[error("{failed} package(s) could not be archived")]
    PackagesFailed {
        /// Number of failed packages.
        failed: usize,
    },
}

/// Result type alias using [`ArchiveError`].
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_error_names_the_package() {
        let err = BuildError::Package {
            package: PackageId::new("vendor/name", "1.2.3"),
            source: ArchiveError::Backend {
                reason: "disk full".to_owned(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("vendor/name 1.2.3"));
        assert!(msg.contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn filesystem_error_includes_path_and_kind() {
        let err = ArchiveError::filesystem(
            Utf8Path::new("/out/dist"),
            std::io::Error::other("permission denied"),
        );
        assert!(err.to_string().contains("/out/dist"));
        assert_eq!(err.kind(), "filesystem");
    }

    #[test]
    fn cli_error_is_transparent_over_config_errors() {
        let err = CliError::from(ConfigError::MissingEndpoint);
        assert_eq!(err.to_string(), ConfigError::MissingEndpoint.to_string());
    }

    #[test]
    fn cancelled_reports_progress() {
        let err = BuildError::Cancelled { processed: 3 };
        assert!(err.to_string().contains('3'));
    }
}
