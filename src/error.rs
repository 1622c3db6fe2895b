//! Error types for configuration and package file handling.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading `satis.json` or resolving a build from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Archive dumping was requested but `archive` is absent.
    #[error("the configuration has no \"archive\" section")]
    MissingArchiveSection,

    /// Neither `archive.prefix-url` nor `homepage` is set.
    #[error("set \"archive.prefix-url\" or \"homepage\" so dist URLs can be generated")]
    MissingEndpoint,

    /// `archive.format` names a container this build cannot write.
    #[error("unsupported archive format \"{format}\"; expected one of: {expected}")]
    UnsupportedFormat {
        /// The rejected format string.
        format: String,
        /// Comma-separated list of accepted formats.
        expected: String,
    },

    /// No output directory was given on the command line or in `output-dir`.
    #[error("no output directory given; pass one or set \"output-dir\"")]
    MissingOutputDirectory,
}

/// Errors raised while reading or writing a packages JSON file.
#[derive(Debug, Error)]
pub enum PackageFileError {
    /// The file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path of the packages file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file content is not a JSON array of packages.
    #[error("invalid packages file {path}: {source}")]
    Json {
        /// Path of the packages file.
        path: Utf8PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_lists_alternatives() {
        let err = ConfigError::UnsupportedFormat {
            format: "rar".to_owned(),
            expected: "zip, tar".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rar"));
        assert!(msg.contains("zip, tar"));
    }

    #[test]
    fn read_error_preserves_source() {
        let err = ConfigError::Read {
            path: Utf8PathBuf::from("satis.json"),
            source: std::io::Error::other("denied"),
        };
        assert!(err.to_string().contains("satis.json"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
