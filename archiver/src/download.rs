//! Fetching package distributions and sources.
//!
//! Provides a trait-based abstraction over fetching a package into a local
//! directory so the pipeline can be tested without network access. The
//! production [`DistDownloader`] reads dists over HTTP(S) with `ureq` or from
//! the local filesystem, and checks sources out with git.

use crate::extract::{self, DistArchive, ExtractionError};
use crate::git;
use crate::paths::url_basename;
use camino::Utf8Path;
use satis::{DistRecord, Package, SourceRecord};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout for dist downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches packages into local directories.
#[cfg_attr(test, mockall::automock)]
pub trait PackageDownloader {
    /// Fetch `package` into the existing directory `dest`.
    ///
    /// Pre-archived packages are stored verbatim under their URL's file name;
    /// anything else is unpacked so `dest` holds the package's files.
    /// `prefer_source` checks the source out even when a dist exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer, extraction or checkout fails.
    fn fetch(&self, package: &Package, dest: &Utf8Path, prefer_source: bool) -> Result<(), DownloadError>;
}

/// Errors arising from fetching a package.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested file was not found (HTTP 404 or missing local file).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that could not be found.
        url: String,
    },

    /// I/O error writing the downloaded files.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),

    /// The downloaded archive could not be unpacked.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The package has neither a dist nor a source to fetch.
    #[error("{package} has no dist or source to fetch")]
    NothingToFetch {
        /// The package identity.
        package: String,
    },

    /// The source uses a version control system other than git.
    #[error("unsupported source type '{kind}'")]
    UnsupportedSource {
        /// The source type.
        kind: String,
    },

    /// A git operation failed.
    #[error("git {operation} failed: {message}")]
    Git {
        /// The git subcommand.
        operation: &'static str,
        /// Trimmed stderr or a timeout description.
        message: String,
    },
}

/// Production downloader.
#[derive(Debug, Clone)]
pub struct DistDownloader {
    git_timeout: Duration,
}

impl Default for DistDownloader {
    fn default() -> Self {
        Self {
            git_timeout: git::GIT_TIMEOUT,
        }
    }
}

impl DistDownloader {
    /// Downloader with the default git timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the timeout applied to each git command.
    #[must_use]
    pub const fn with_git_timeout(mut self, timeout: Duration) -> Self {
        self.git_timeout = timeout;
        self
    }

    fn fetch_source(&self, source: &SourceRecord, dest: &Utf8Path) -> Result<(), DownloadError> {
        if source.kind != "git" {
            return Err(DownloadError::UnsupportedSource {
                kind: source.kind.clone(),
            });
        }
        git::checkout(&source.url, source.reference.as_deref(), dest, self.git_timeout)
    }
}

impl PackageDownloader for DistDownloader {
    fn fetch(&self, package: &Package, dest: &Utf8Path, prefer_source: bool) -> Result<(), DownloadError> {
        fs::create_dir_all(dest)?;

        if package.is_pre_archived() {
            let dist = package.dist().ok_or_else(|| DownloadError::NothingToFetch {
                package: package.id().to_string(),
            })?;
            let filename = non_empty(url_basename(dist.url()));
            log::debug!("fetching {} verbatim from {}", package.id(), dist.url());
            return fetch_file(dist.url(), dest.join(filename).as_std_path());
        }

        match (package.dist(), package.source()) {
            (_, Some(source)) if prefer_source => {
                log::debug!("checking out {} from {}", package.id(), source.url);
                self.fetch_source(source, dest)
            }
            (Some(dist), _) => {
                log::debug!("fetching {} from {}", package.id(), dist.url());
                fetch_dist(dist, dest)
            }
            (None, Some(source)) => {
                log::debug!("checking out {} from {}", package.id(), source.url);
                self.fetch_source(source, dest)
            }
            (None, None) => Err(DownloadError::NothingToFetch {
                package: package.id().to_string(),
            }),
        }
    }
}

fn fetch_dist(dist: &DistRecord, dest: &Utf8Path) -> Result<(), DownloadError> {
    let filename = url_basename(dist.url());
    let Some(kind) = DistArchive::detect(dist.kind(), filename) else {
        return fetch_file(dist.url(), dest.join(non_empty(filename)).as_std_path());
    };

    let scratch = tempfile::Builder::new().prefix("satis_dist_").tempdir()?;
    let archive = scratch.path().join(non_empty(filename));
    fetch_file(dist.url(), &archive)?;
    extract::extract(kind, &archive, dest.as_std_path())?;
    Ok(())
}

fn non_empty(filename: &str) -> &str {
    if filename.is_empty() { "download" } else { filename }
}

/// Copy the file behind `url` to `dest`.
///
/// `http(s)://` URLs are downloaded; `file://` URLs and bare paths are copied.
fn fetch_file(url: &str, dest: &Path) -> Result<(), DownloadError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return download_to_file(url, dest);
    }
    let local = url.strip_prefix("file://").unwrap_or(url);
    match fs::copy(local, dest) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DownloadError::NotFound {
            url: url.to_owned(),
        }),
        Err(e) => Err(DownloadError::Io(e)),
    }
}

/// Download a URL and write the body to a file.
fn download_to_file(url: &str, dest: &Path) -> Result<(), DownloadError> {
    let response = http_agent()
        .get(url)
        .call()
        .map_err(|e| map_ureq_error(url, &e))?;
    let mut file = fs::File::create(dest)?;
    std::io::copy(&mut response.into_body().as_reader(), &mut file).map_err(DownloadError::Io)?;
    Ok(())
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use satis::PRE_ARCHIVED_TYPE;
    use tempfile::TempDir;

    struct Dirs {
        _guard: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn dirs() -> Dirs {
        let guard = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(guard.path().to_path_buf()).expect("utf8");
        Dirs {
            _guard: guard,
            root,
        }
    }

    #[rstest]
    fn pre_archived_file_is_copied_verbatim(dirs: Dirs) {
        let upstream = dirs.root.join("Console-1.0.0.tgz");
        fs::write(&upstream, b"\x1f\x8bnot really").expect("write");
        let package = Package::new("pear/console", "1.0.0")
            .with_kind(PRE_ARCHIVED_TYPE)
            .with_dist(DistRecord::new("file", format!("file://{upstream}")));
        let dest = dirs.root.join("dest");

        DistDownloader::new()
            .fetch(&package, &dest, false)
            .expect("fetches");

        let copied = fs::read(dest.join("Console-1.0.0.tgz")).expect("copied");
        assert_eq!(copied, b"\x1f\x8bnot really");
    }

    #[rstest]
    fn zip_dist_is_unpacked(dirs: Dirs) {
        let upstream = dirs.root.join("pkg.zip");
        let mut zip = zip::ZipWriter::new(fs::File::create(&upstream).expect("create"));
        zip.start_file("pkg/composer.json", zip::write::SimpleFileOptions::default())
            .expect("start");
        std::io::Write::write_all(&mut zip, b"{}").expect("write");
        zip.finish().expect("finish");
        let package = Package::new("vendor/pkg", "1.0.0").with_dist(DistRecord::new("zip", upstream.as_str()));
        let dest = dirs.root.join("dest");

        DistDownloader::new()
            .fetch(&package, &dest, false)
            .expect("fetches");

        assert!(dest.join("composer.json").is_file());
    }

    #[rstest]
    fn missing_local_file_is_not_found(dirs: Dirs) {
        let package = Package::new("vendor/pkg", "1.0.0")
            .with_dist(DistRecord::new("zip", dirs.root.join("absent.zip").as_str()));

        let outcome = DistDownloader::new().fetch(&package, &dirs.root.join("dest"), false);

        assert!(matches!(outcome, Err(DownloadError::NotFound { .. })));
    }

    #[rstest]
    fn package_without_dist_or_source_fails(dirs: Dirs) {
        let outcome = DistDownloader::new().fetch(
            &Package::new("vendor/pkg", "1.0.0"),
            &dirs.root.join("dest"),
            false,
        );

        assert!(matches!(outcome, Err(DownloadError::NothingToFetch { .. })));
    }

    #[rstest]
    fn non_git_sources_are_rejected(dirs: Dirs) {
        let package = Package::new("vendor/pkg", "1.0.0").with_source(SourceRecord {
            kind: "svn".to_owned(),
            url: "svn://example.test/pkg".to_owned(),
            reference: None,
        });

        let outcome = DistDownloader::new().fetch(&package, &dirs.root.join("dest"), true);

        assert!(matches!(outcome, Err(DownloadError::UnsupportedSource { .. })));
    }

    #[test]
    fn git_timeout_defaults_and_overrides() {
        assert_eq!(DistDownloader::new().git_timeout, git::GIT_TIMEOUT);
        let custom = DistDownloader::new().with_git_timeout(Duration::from_secs(5));
        assert_eq!(custom.git_timeout, Duration::from_secs(5));
    }

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/pkg.zip", &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(500);
        let mapped = map_ureq_error("https://example.test/pkg.zip", &err);
        assert!(matches!(mapped, DownloadError::HttpError { .. }));
    }
}
