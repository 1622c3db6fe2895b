//! `satis.json` configuration schema.
//!
//! Only the keys the builders act on are modelled; everything else in the file
//! (repositories, requirements, and so on) is ignored here because other tools
//! own it. Missing keys fall back to the same defaults Satis has always used,
//! so a minimal `{"archive": {"directory": "dist"}}` is a working archive
//! configuration.

use crate::error::ConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Script event fired before an archive is dumped from a source checkout.
pub const PRE_ARCHIVE_DUMP_EVENT: &str = "pre-archive-dump-cmd";

/// Top-level repository configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct SatisConfig {
    /// Repository name.
    pub name: Option<String>,
    /// Public URL of the repository; the dist URL fallback.
    pub homepage: Option<String>,
    /// Default output directory.
    pub output_dir: Option<Utf8PathBuf>,
    /// Archive dumping settings. Absent means archives are not dumped.
    pub archive: Option<ArchiveConfig>,
    /// Shell commands keyed by event name.
    pub scripts: BTreeMap<String, ScriptCommands>,
}

impl SatisConfig {
    /// Load and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid JSON for the schema.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Base URL for generated dist URLs: `archive.prefix-url`, else
    /// `homepage`, without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.archive
            .as_ref()
            .and_then(|archive| archive.prefix_url.as_deref())
            .or(self.homepage.as_deref())
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    /// Commands registered for `event`, in declaration order.
    #[must_use]
    pub fn scripts_for(&self, event: &str) -> Vec<String> {
        self.scripts
            .get(event)
            .map(ScriptCommands::to_vec)
            .unwrap_or_default()
    }
}

/// The `archive` section.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArchiveConfig {
    /// Directory under the output directory (and under the public URL) that
    /// holds the archives.
    pub directory: String,
    /// Archive container: `zip`, `tar`, or `tar.gz`.
    pub format: String,
    /// Write archives here instead of `{output-dir}/{directory}`.
    pub absolute_directory: Option<Utf8PathBuf>,
    /// Leave development versions unarchived.
    pub skip_dev: bool,
    /// When non-empty, only these packages are archived.
    pub whitelist: Vec<String>,
    /// Packages never archived.
    pub blacklist: Vec<String>,
    /// Public base URL for the archives.
    pub prefix_url: Option<String>,
    /// Record a SHA-1 checksum in each dist.
    pub checksum: bool,
    /// Archive every file, ignoring export-ignore and exclude rules.
    pub ignore_filters: bool,
    /// Advertise every archive with the configured format as its dist type.
    pub override_dist_type: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            directory: "dist".to_owned(),
            format: "zip".to_owned(),
            absolute_directory: None,
            skip_dev: false,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            prefix_url: None,
            checksum: true,
            ignore_filters: false,
            override_dist_type: false,
        }
    }
}

/// A script entry: one command or a list of commands.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum ScriptCommands {
    /// A single command line.
    One(String),
    /// Several command lines, run in order.
    Many(Vec<String>),
}

impl ScriptCommands {
    /// The commands as an owned list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(command) => vec![command.clone()],
            Self::Many(commands) => commands.clone(),
        }
    }
}
