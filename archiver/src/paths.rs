//! Output path planning.
//!
//! Each package's archive lives in `{base}/{intermediate}/{file}`, where the
//! intermediate directory is the package name made filesystem-safe and the
//! file name comes from the archive backend's naming convention. Planning is
//! pure: nothing here touches the disk.

use crate::backend::ArchiveBackend;
use crate::config::BuildConfig;
use crate::error::{ArchiveError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use satis::Package;

/// How the artefact at the planned path will be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Relocate the original distribution file verbatim.
    PassThrough,
    /// Snapshot the source into the configured format.
    Synthesize,
    /// Synthesize, then publish under the name the configured format implies.
    Override,
}

/// Where a package's artefact goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPlan {
    /// Sanitised package name used as a directory.
    pub intermediate_dir: String,
    /// `{base}/{intermediate_dir}`.
    pub target_dir: Utf8PathBuf,
    /// Expected final artefact path.
    pub final_path: Utf8PathBuf,
    /// How the artefact is produced.
    pub strategy: Strategy,
}

/// Replace every character outside `[A-Za-z0-9-_/]` with `-` and drop empty
/// path segments, so the result is always relative.
///
/// # Examples
///
/// ```
/// use satis_archiver::paths::intermediate_dir;
///
/// assert_eq!(intermediate_dir("vendor/name:weird name!"), "vendor/name-weird-name-");
/// assert_eq!(intermediate_dir("/tmp//escape"), "tmp/escape");
/// ```
#[must_use]
pub fn intermediate_dir(name: &str) -> String {
    let sanitised: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/') {
                c
            } else {
                '-'
            }
        })
        .collect();
    sanitised
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Last path segment of a URL, ignoring any query or fragment.
#[must_use]
pub fn url_basename(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = url.get(..end).unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Extension of a URL's last path segment, if it has one.
#[must_use]
pub fn url_extension(url: &str) -> Option<&str> {
    let basename = url_basename(url);
    basename
        .rfind('.')
        .and_then(|dot| basename.get(dot + 1..))
        .filter(|ext| !ext.is_empty())
}

/// Plan the artefact location for `package`.
///
/// # Errors
///
/// Returns [`ArchiveError::Backend`] when a pre-archived package has no dist
/// URL to take the file from.
pub fn plan(
    package: &Package,
    config: &BuildConfig,
    base_dir: &Utf8Path,
    backend: &dyn ArchiveBackend,
) -> Result<PathPlan> {
    let intermediate_dir = intermediate_dir(package.name());
    let target_dir = base_dir.join(&intermediate_dir);

    let (strategy, filename) = if package.is_pre_archived() {
        let dist = package.dist().ok_or_else(|| ArchiveError::Backend {
            reason: format!("pre-archived package {} has no dist URL", package.id()),
        })?;
        let stem = backend.filename(package);
        let filename = match url_extension(dist.url()) {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        };
        (Strategy::PassThrough, filename)
    } else if config.override_dist_type {
        let overridden = package.with_dist_kind(config.format.as_str());
        let filename = format!(
            "{}.{}",
            backend.filename(&overridden),
            config.format.extension()
        );
        (Strategy::Override, filename)
    } else {
        let filename = format!("{}.{}", backend.filename(package), config.format.extension());
        (Strategy::Synthesize, filename)
    };

    Ok(PathPlan {
        final_path: target_dir.join(filename),
        intermediate_dir,
        target_dir,
        strategy,
    })
}
