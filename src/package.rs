//! Package records exchanged between the resolver, the builders, and the
//! index writer.
//!
//! A [`Package`] is read-only apart from its dist record, which the archive
//! builder replaces as a whole through [`Package::apply_dist`]. Keys this model
//! does not know about are kept in an opaque map so that a round trip through
//! the builder never drops metadata the index writer needs.

use crate::error::PackageFileError;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Package type whose distribution is already an installable archive.
pub const PRE_ARCHIVED_TYPE: &str = "pear-library";

/// Package type that carries no files.
pub const METAPACKAGE_TYPE: &str = "metapackage";

/// Dist type telling clients to fetch the file verbatim.
pub const PASS_THROUGH_DIST_TYPE: &str = "file";

const DEFAULT_TYPE: &str = "library";

/// Where a package's source code lives (usually a VCS repository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// VCS type, e.g. `git`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Repository URL or local path.
    pub url: String,
    /// Commit, tag, or other revision identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Location, type, and checksum of a package's downloadable artefact.
///
/// Dist records are values: a package's dist is swapped for a new record,
/// never edited field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistRecord {
    #[serde(rename = "type")]
    kind: String,
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shasum: Option<String>,
}

impl DistRecord {
    /// Create a dist record with no reference and no checksum.
    #[must_use]
    pub fn new(kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            url: url.into(),
            reference: None,
            shasum: None,
        }
    }

    /// Set the reference.
    #[must_use]
    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Set the SHA-1 checksum.
    #[must_use]
    pub fn with_shasum(mut self, shasum: Option<String>) -> Self {
        self.shasum = shasum;
        self
    }

    /// Dist type (`zip`, `tar`, `file`, ...).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Public download URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Revision the artefact was built from.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Lowercase hex SHA-1 of the artefact, when recorded.
    #[must_use]
    pub fn shasum(&self) -> Option<&str> {
        self.shasum.as_deref()
    }
}

/// Per-package archive settings from the package's own metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Patterns of files to leave out of generated archives.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl ArchiveSettings {
    fn is_empty(&self) -> bool {
        self.exclude.is_empty()
    }
}

/// Human-readable package identity used in logs and errors.
///
/// Renders as `name version`, matching how the package is presented to users.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId {
    name: String,
    version: String,
}

impl PackageId {
    /// Create an identity from a name and pretty version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pretty version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// A resolved package version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    name: String,
    #[serde(rename = "version")]
    pretty_version: String,
    #[serde(
        rename = "version_normalized",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    normalized_version: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<SourceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dist: Option<DistRecord>,
    #[serde(default, skip_serializing_if = "ArchiveSettings::is_empty")]
    archive: ArchiveSettings,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_owned()
}

impl Package {
    /// Create a `library` package with no source or dist.
    #[must_use]
    pub fn new(name: impl Into<String>, pretty_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pretty_version: pretty_version.into(),
            normalized_version: None,
            kind: default_type(),
            source: None,
            dist: None,
            archive: ArchiveSettings::default(),
            extra: Map::new(),
        }
    }

    /// Set the normalised version.
    #[must_use]
    pub fn with_normalized_version(mut self, version: impl Into<String>) -> Self {
        self.normalized_version = Some(version.into());
        self
    }

    /// Set the package type.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the source record.
    #[must_use]
    pub fn with_source(mut self, source: SourceRecord) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the dist record.
    #[must_use]
    pub fn with_dist(mut self, dist: DistRecord) -> Self {
        self.dist = Some(dist);
        self
    }

    /// Set the archive exclude patterns.
    #[must_use]
    pub fn with_archive_excludes(mut self, exclude: Vec<String>) -> Self {
        self.archive.exclude = exclude;
        self
    }

    /// Package name, e.g. `vendor/name`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version as written by the package author.
    #[must_use]
    pub fn pretty_version(&self) -> &str {
        &self.pretty_version
    }

    /// Normalised version, falling back to the pretty version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.normalized_version
            .as_deref()
            .unwrap_or(&self.pretty_version)
    }

    /// Package type.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Source record, if any.
    #[must_use]
    pub fn source(&self) -> Option<&SourceRecord> {
        self.source.as_ref()
    }

    /// Source revision, if any.
    #[must_use]
    pub fn source_reference(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.reference.as_deref())
    }

    /// Dist record, if any.
    #[must_use]
    pub fn dist(&self) -> Option<&DistRecord> {
        self.dist.as_ref()
    }

    /// Archive exclude patterns declared by the package.
    #[must_use]
    pub fn archive_excludes(&self) -> &[String] {
        &self.archive.exclude
    }

    /// Identity for logs and errors.
    #[must_use]
    pub fn id(&self) -> PackageId {
        PackageId::new(&self.name, &self.pretty_version)
    }

    /// Whether the package's distribution is already an installable archive.
    #[must_use]
    pub fn is_pre_archived(&self) -> bool {
        self.kind == PRE_ARCHIVED_TYPE
    }

    /// Whether the package is a metapackage.
    #[must_use]
    pub fn is_metapackage(&self) -> bool {
        self.kind == METAPACKAGE_TYPE
    }

    /// Whether this is a development version (`dev-*` or `*-dev`).
    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.pretty_version.starts_with("dev-") || self.version().ends_with("-dev")
    }

    /// A copy of the package whose dist type reads as `kind`.
    ///
    /// The copy is only used to derive names; it is never written back.
    #[must_use]
    pub fn with_dist_kind(&self, kind: &str) -> Self {
        let mut copy = self.clone();
        if let Some(dist) = copy.dist.as_mut() {
            kind.clone_into(&mut dist.kind);
        }
        copy
    }

    /// Replace the dist record, returning the previous one.
    pub fn apply_dist(&mut self, dist: DistRecord) -> Option<DistRecord> {
        self.dist.replace(dist)
    }
}

/// Read a JSON array of packages.
///
/// # Errors
///
/// Returns [`PackageFileError::Io`] if the file cannot be read or
/// [`PackageFileError::Json`] if it is not a package array.
pub fn read_packages(path: &Utf8Path) -> Result<Vec<Package>, PackageFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| PackageFileError::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| PackageFileError::Json {
        path: path.to_owned(),
        source,
    })
}

/// Write packages as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PackageFileError`] on serialisation or I/O failure.
pub fn write_packages(path: &Utf8Path, packages: &[Package]) -> Result<(), PackageFileError> {
    let json = serde_json::to_string_pretty(packages).map_err(|source| PackageFileError::Json {
        path: path.to_owned(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| PackageFileError::Io {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn git_source(reference: &str) -> SourceRecord {
        SourceRecord {
            kind: "git".to_owned(),
            url: "https://example.test/repo.git".to_owned(),
            reference: Some(reference.to_owned()),
        }
    }

    #[rstest]
    #[case::dev_prefix("dev-main", None, true)]
    #[case::dev_suffix("1.x-dev", Some("1.9999999.9999999.9999999-dev"), true)]
    #[case::stable("1.2.3", Some("1.2.3.0"), false)]
    fn detects_dev_versions(
        #[case] pretty: &str,
        #[case] normalized: Option<&str>,
        #[case] expected: bool,
    ) {
        let mut package = Package::new("vendor/name", pretty);
        if let Some(version) = normalized {
            package = package.with_normalized_version(version);
        }
        assert_eq!(package.is_dev(), expected);
    }

    #[test]
    fn apply_dist_replaces_the_whole_record() {
        let mut package = Package::new("vendor/name", "1.0.0")
            .with_dist(DistRecord::new("zip", "https://old.test/a.zip").with_shasum(Some("x".to_owned())));

        let previous = package.apply_dist(DistRecord::new("tar", "https://new.test/a.tar"));

        assert_eq!(previous.map(|d| d.url().to_owned()).as_deref(), Some("https://old.test/a.zip"));
        let dist = package.dist().expect("dist set");
        assert_eq!(dist.kind(), "tar");
        assert!(dist.shasum().is_none());
    }

    #[test]
    fn with_dist_kind_leaves_the_original_untouched() {
        let package = Package::new("vendor/name", "1.0.0").with_dist(DistRecord::new("git", "u"));
        let copy = package.with_dist_kind("zip");

        assert_eq!(copy.dist().map(DistRecord::kind), Some("zip"));
        assert_eq!(package.dist().map(DistRecord::kind), Some("git"));
    }

    #[test]
    fn round_trip_keeps_unknown_keys() {
        let json = r#"{
            "name": "vendor/name",
            "version": "1.0.0",
            "version_normalized": "1.0.0.0",
            "require": {"php": ">=8.1"},
            "source": {"type": "git", "url": "https://example.test/repo.git", "reference": "abc"}
        }"#;
        let package: Package = serde_json::from_str(json).expect("valid package");

        assert_eq!(package.kind(), "library");
        assert_eq!(package.source_reference(), Some("abc"));

        let value = serde_json::to_value(&package).expect("serialise");
        assert_eq!(value["require"]["php"], ">=8.1");
        assert_eq!(value["type"], "library");
    }

    #[test]
    fn package_id_displays_name_and_version() {
        let package = Package::new("vendor/name", "2.0.0").with_source(git_source("abc"));
        assert_eq!(package.id().to_string(), "vendor/name 2.0.0");
    }

    #[test]
    fn packages_file_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = camino::Utf8PathBuf::try_from(dir.path().join("packages.json"))
            .expect("UTF-8 path");
        let packages = vec![Package::new("vendor/a", "1.0.0").with_kind(PRE_ARCHIVED_TYPE)];

        write_packages(&path, &packages).expect("write");
        let loaded = read_packages(&path).expect("read");

        assert_eq!(loaded, packages);
    }
}
