//! Rewriting a package's dist record to point at its produced artefact.

use crate::config::BuildConfig;
use crate::error::{ArchiveError, Result};
use crate::filesystem::sha1_file;
use crate::paths::PathPlan;
use crate::producer::Produced;
use satis::{DistRecord, Package};

/// Public URL of `filename` inside `intermediate_dir`.
///
/// # Examples
///
/// ```
/// use satis_archiver::config::BuildConfig;
/// use satis_archiver::dist::dist_url;
///
/// let config = BuildConfig::new("/srv/repo", "https://repo.test");
/// assert_eq!(
///     dist_url(&config, "vendor/name", "vendor-name-1.0.0.zip"),
///     "https://repo.test/dist/vendor/name/vendor-name-1.0.0.zip"
/// );
/// ```
#[must_use]
pub fn dist_url(config: &BuildConfig, intermediate_dir: &str, filename: &str) -> String {
    format!("{}{intermediate_dir}/{filename}", config.url_prefix())
}

/// Dist record describing `produced` for `package`.
///
/// # Errors
///
/// Returns [`ArchiveError::Backend`] if the artefact path has no file name and
/// [`ArchiveError::Filesystem`] if the checksum cannot be computed.
pub fn dist_record(
    package: &Package,
    plan: &PathPlan,
    produced: &Produced,
    config: &BuildConfig,
) -> Result<DistRecord> {
    let filename = produced.path.file_name().ok_or_else(|| ArchiveError::Backend {
        reason: format!("artefact path {} has no file name", produced.path),
    })?;
    let shasum = if config.include_checksum {
        Some(sha1_file(&produced.path)?)
    } else {
        None
    };

    Ok(
        DistRecord::new(&produced.dist_type, dist_url(config, &plan.intermediate_dir, filename))
            .with_reference(package.source_reference().map(str::to_owned))
            .with_shasum(shasum),
    )
}

/// Replace `package`'s dist with one describing `produced`.
///
/// The record is computed in full before the package is touched, so on error
/// the package keeps its previous dist.
///
/// # Errors
///
/// See [`dist_record`].
pub fn apply(
    package: &mut Package,
    plan: &PathPlan,
    produced: &Produced,
    config: &BuildConfig,
) -> Result<()> {
    let record = dist_record(package, plan, produced, config)?;
    log::debug!("{} now served from {}", package.id(), record.url());
    package.apply_dist(record);
    Ok(())
}
