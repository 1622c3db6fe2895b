//! Which packages the builder leaves alone.
//!
//! Checks run in a fixed order and the first match decides the reason:
//! metapackages, development versions when `skip-dev` is set, packages
//! missing from a non-empty whitelist, blacklisted packages, and finally
//! packages whose dist already points at a matching archive in the output
//! tree. Only the last check touches the disk, and only to stat one file.

use crate::config::BuildConfig;
use crate::paths::intermediate_dir;
use camino::Utf8Path;
use satis::{PASS_THROUGH_DIST_TYPE, Package};
use std::fmt;

/// Why a package is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Metapackages have no files.
    Metapackage,
    /// Development version with `skip-dev` enabled.
    DevVersion,
    /// Not on the configured whitelist.
    NotWhitelisted,
    /// On the configured blacklist.
    Blacklisted,
    /// Dist already points at an up-to-date archive.
    AlreadyArchived,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Metapackage => "metapackage",
            Self::DevVersion => "development version",
            Self::NotWhitelisted => "not whitelisted",
            Self::Blacklisted => "blacklisted",
            Self::AlreadyArchived => "already archived",
        })
    }
}

/// Decide whether `package` is skipped, and why.
///
/// `base_dir` is the archive base directory of `config`.
#[must_use]
pub fn should_skip(package: &Package, config: &BuildConfig, base_dir: &Utf8Path) -> Option<SkipReason> {
    let name = package.name();
    if package.is_metapackage() {
        Some(SkipReason::Metapackage)
    } else if config.skip_dev && package.is_dev() {
        Some(SkipReason::DevVersion)
    } else if !config.whitelist.is_empty() && !config.whitelist.iter().any(|n| n == name) {
        Some(SkipReason::NotWhitelisted)
    } else if config.blacklist.iter().any(|n| n == name) {
        Some(SkipReason::Blacklisted)
    } else if is_already_archived(package, config, base_dir) {
        Some(SkipReason::AlreadyArchived)
    } else {
        None
    }
}

/// Whether `package` is skipped.
#[must_use]
pub fn is_skippable(package: &Package, config: &BuildConfig, base_dir: &Utf8Path) -> bool {
    should_skip(package, config, base_dir).is_some()
}

fn is_already_archived(package: &Package, config: &BuildConfig, base_dir: &Utf8Path) -> bool {
    let Some(dist) = package.dist() else {
        return false;
    };

    let expected_type = if package.is_pre_archived() {
        PASS_THROUGH_DIST_TYPE
    } else {
        config.format.as_str()
    };
    if dist.kind() != expected_type
        || dist.shasum().is_some() != config.include_checksum
        || dist.reference() != package.source_reference()
    {
        return false;
    }

    let intermediate = intermediate_dir(package.name());
    let prefix = format!("{}{intermediate}/", config.url_prefix());
    match dist.url().strip_prefix(&prefix) {
        Some(filename) if !filename.is_empty() && !filename.contains('/') => {
            base_dir.join(&intermediate).join(filename).is_file()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ArchiveFormat;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use satis::{DistRecord, METAPACKAGE_TYPE, PRE_ARCHIVED_TYPE, SourceRecord};
    use tempfile::TempDir;

    struct Output {
        _guard: TempDir,
        config: BuildConfig,
        base_dir: Utf8PathBuf,
    }

    #[fixture]
    fn output() -> Output {
        let guard = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(guard.path().to_path_buf()).expect("utf8");
        let config = BuildConfig::new(root, "https://repo.test");
        let base_dir = config.base_dir();
        Output {
            _guard: guard,
            config,
            base_dir,
        }
    }

    fn source() -> SourceRecord {
        SourceRecord {
            kind: "git".to_owned(),
            url: "https://git.test/a.git".to_owned(),
            reference: Some("abc123".to_owned()),
        }
    }

    fn archived(output: &Output, kind: &str, shasum: Option<&str>) -> Package {
        let dir = output.base_dir.join("vendor/name");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("vendor-name-1.0.0.zip"), "zip").expect("write");
        Package::new("vendor/name", "1.0.0").with_source(source()).with_dist(
            DistRecord::new(kind, "https://repo.test/dist/vendor/name/vendor-name-1.0.0.zip")
                .with_reference(Some("abc123".to_owned()))
                .with_shasum(shasum.map(str::to_owned)),
        )
    }

    #[rstest]
    fn metapackages_are_skipped_first(output: Output) {
        let mut config = output.config.clone();
        config.blacklist = vec!["vendor/meta".to_owned()];
        let package = Package::new("vendor/meta", "1.0.0").with_kind(METAPACKAGE_TYPE);

        assert_eq!(
            should_skip(&package, &config, &output.base_dir),
            Some(SkipReason::Metapackage)
        );
    }

    #[rstest]
    #[case::dev_prefix("dev-main", true)]
    #[case::stable("1.0.0", false)]
    fn dev_versions_skipped_only_when_configured(
        output: Output,
        #[case] version: &str,
        #[case] skipped: bool,
    ) {
        let mut config = output.config.clone();
        let package = Package::new("vendor/name", version);
        assert_eq!(should_skip(&package, &config, &output.base_dir), None);

        config.skip_dev = true;
        assert_eq!(is_skippable(&package, &config, &output.base_dir), skipped);
    }

    #[rstest]
    fn whitelist_and_blacklist(output: Output) {
        let mut config = output.config.clone();
        config.whitelist = vec!["vendor/a".to_owned(), "vendor/b".to_owned()];
        config.blacklist = vec!["vendor/b".to_owned()];

        let reason = |name: &str| should_skip(&Package::new(name, "1.0.0"), &config, &output.base_dir);

        assert_eq!(reason("vendor/a"), None);
        assert_eq!(reason("vendor/b"), Some(SkipReason::Blacklisted));
        assert_eq!(reason("vendor/c"), Some(SkipReason::NotWhitelisted));
    }

    #[rstest]
    fn matching_archive_on_disk_is_skipped(output: Output) {
        let package = archived(&output, "zip", Some("deadbeef"));
        assert_eq!(
            should_skip(&package, &output.config, &output.base_dir),
            Some(SkipReason::AlreadyArchived)
        );
    }

    #[rstest]
    fn checksum_setting_change_forces_rebuild(output: Output) {
        let package = archived(&output, "zip", None);
        assert!(!is_skippable(&package, &output.config, &output.base_dir));
    }

    #[rstest]
    fn format_change_forces_rebuild(output: Output) {
        let package = archived(&output, "zip", Some("deadbeef"));
        let mut config = output.config.clone();
        config.format = ArchiveFormat::Tar;
        assert!(!is_skippable(&package, &config, &output.base_dir));
    }

    #[rstest]
    fn endpoint_change_forces_rebuild(output: Output) {
        let package = archived(&output, "zip", Some("deadbeef"));
        let mut config = output.config.clone();
        config.endpoint = "https://mirror.test".to_owned();
        assert!(!is_skippable(&package, &config, &output.base_dir));
    }

    #[rstest]
    fn missing_file_forces_rebuild(output: Output) {
        let package = archived(&output, "zip", Some("deadbeef"));
        std::fs::remove_file(output.base_dir.join("vendor/name/vendor-name-1.0.0.zip")).expect("remove");
        assert!(!is_skippable(&package, &output.config, &output.base_dir));
    }

    #[rstest]
    fn upstream_dist_is_not_mistaken_for_an_archive(output: Output) {
        let package = Package::new("vendor/name", "1.0.0")
            .with_dist(DistRecord::new("zip", "https://codeload.test/vendor/name/zip/abc"));
        assert!(!is_skippable(&package, &output.config, &output.base_dir));
    }

    #[rstest]
    fn pre_archived_package_expects_file_dist_type(output: Output) {
        let dir = output.base_dir.join("pear/console");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("pear-console-1.0.0.tgz"), "tgz").expect("write");
        let package = Package::new("pear/console", "1.0.0")
            .with_kind(PRE_ARCHIVED_TYPE)
            .with_dist(
                DistRecord::new("file", "https://repo.test/dist/pear/console/pear-console-1.0.0.tgz")
                    .with_shasum(Some("cafe".to_owned())),
            );

        assert!(is_skippable(&package, &output.config, &output.base_dir));
    }

    #[rstest]
    fn leading_slash_names_resolve_under_the_base_dir(output: Output) {
        let dir = output.base_dir.join("tmp/escape");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("tmp-escape-1.0.0.zip"), "zip").expect("write");
        let package = Package::new("/tmp/escape", "1.0.0").with_dist(
            DistRecord::new("zip", "https://repo.test/dist/tmp/escape/tmp-escape-1.0.0.zip")
                .with_shasum(Some("deadbeef".to_owned())),
        );

        assert_eq!(
            should_skip(&package, &output.config, &output.base_dir),
            Some(SkipReason::AlreadyArchived)
        );
    }
}
