//! Resolved configuration for one archive build.
//!
//! [`BuildConfig`] is derived once from `satis.json` plus command-line
//! overrides and is read-only for the rest of the run.

use crate::format::ArchiveFormat;
use camino::Utf8PathBuf;
use satis::{ConfigError, SatisConfig};

/// Settings every pipeline component reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Archive container format.
    pub format: ArchiveFormat,
    /// Public base URL for dist URLs, without a trailing slash.
    pub endpoint: String,
    /// Record SHA-1 checksums.
    pub include_checksum: bool,
    /// Archive every file, ignoring export-ignore and exclude rules.
    pub ignore_filters: bool,
    /// Advertise archives with the configured format as dist type.
    pub override_dist_type: bool,
    /// Repository output directory.
    pub output_dir: Utf8PathBuf,
    /// Archive directory under the output directory and the endpoint.
    pub archive_directory: String,
    /// Absolute archive directory overriding `output_dir/archive_directory`.
    pub absolute_directory: Option<Utf8PathBuf>,
    /// Skip development versions.
    pub skip_dev: bool,
    /// Only archive these packages when non-empty.
    pub whitelist: Vec<String>,
    /// Never archive these packages.
    pub blacklist: Vec<String>,
    /// Log and continue when a package fails.
    pub skip_errors: bool,
    /// Render a progress bar instead of per-package lines.
    pub render_progress: bool,
    /// Seed for the package shuffle; random when absent.
    pub seed: Option<u64>,
}

impl BuildConfig {
    /// A configuration with Satis defaults for the given output directory
    /// and endpoint.
    #[must_use]
    pub fn new(output_dir: impl Into<Utf8PathBuf>, endpoint: impl Into<String>) -> Self {
        Self {
            format: ArchiveFormat::Zip,
            endpoint: endpoint.into(),
            include_checksum: true,
            ignore_filters: false,
            override_dist_type: false,
            output_dir: output_dir.into(),
            archive_directory: "dist".to_owned(),
            absolute_directory: None,
            skip_dev: false,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            skip_errors: false,
            render_progress: false,
            seed: None,
        }
    }

    /// Resolve the archive settings of `config`.
    ///
    /// `output_dir` overrides the file's `output-dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingArchiveSection`] without an `archive`
    /// section, [`ConfigError::MissingEndpoint`] without `prefix-url` or
    /// `homepage`, [`ConfigError::MissingOutputDirectory`] without any output
    /// directory, and [`ConfigError::UnsupportedFormat`] for unknown formats.
    pub fn from_satis(
        config: &SatisConfig,
        output_dir: Option<Utf8PathBuf>,
    ) -> Result<Self, ConfigError> {
        let archive = config
            .archive
            .as_ref()
            .ok_or(ConfigError::MissingArchiveSection)?;
        let endpoint = config.endpoint().ok_or(ConfigError::MissingEndpoint)?;
        let output_dir = output_dir
            .or_else(|| config.output_dir.clone())
            .ok_or(ConfigError::MissingOutputDirectory)?;
        let format = ArchiveFormat::try_from(archive.format.as_str())?;

        Ok(Self {
            format,
            endpoint: endpoint.to_owned(),
            include_checksum: archive.checksum,
            ignore_filters: archive.ignore_filters,
            override_dist_type: archive.override_dist_type,
            output_dir,
            archive_directory: archive.directory.trim_matches('/').to_owned(),
            absolute_directory: archive.absolute_directory.clone(),
            skip_dev: archive.skip_dev,
            whitelist: archive.whitelist.clone(),
            blacklist: archive.blacklist.clone(),
            skip_errors: false,
            render_progress: false,
            seed: None,
        })
    }

    /// Directory that receives the archives.
    #[must_use]
    pub fn base_dir(&self) -> Utf8PathBuf {
        match &self.absolute_directory {
            Some(directory) => directory.clone(),
            None => self.output_dir.join(&self.archive_directory),
        }
    }

    /// URL prefix shared by every generated dist URL, with a trailing slash.
    ///
    /// An empty archive directory publishes archives directly under the
    /// endpoint.
    #[must_use]
    pub fn url_prefix(&self) -> String {
        if self.archive_directory.is_empty() {
            format!("{}/", self.endpoint)
        } else {
            format!("{}/{}/", self.endpoint, self.archive_directory)
        }
    }
}
