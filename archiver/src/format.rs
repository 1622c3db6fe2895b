//! Archive container formats.

use satis::ConfigError;
use std::fmt;

/// Container format for generated archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArchiveFormat {
    /// Deflate-compressed zip.
    #[default]
    Zip,
    /// Uncompressed tar.
    Tar,
    /// Gzip-compressed tar.
    TarGz,
}

impl ArchiveFormat {
    /// All supported formats.
    pub const ALL: [Self; 3] = [Self::Zip, Self::Tar, Self::TarGz];

    /// Name as used in configuration and dist types.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
        }
    }

    /// File extension, without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl TryFrom<&str> for ArchiveFormat {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalised = value.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            _ => Err(ConfigError::UnsupportedFormat {
                format: value.to_owned(),
                expected: Self::ALL.map(Self::as_str).join(", "),
            }),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("zip", ArchiveFormat::Zip)]
    #[case("TAR", ArchiveFormat::Tar)]
    #[case("tgz", ArchiveFormat::TarGz)]
    #[case("tar.gz", ArchiveFormat::TarGz)]
    fn parses_supported_formats(#[case] input: &str, #[case] expected: ArchiveFormat) {
        assert_eq!(ArchiveFormat::try_from(input).expect("supported"), expected);
    }

    #[test]
    fn rejects_unknown_formats_with_alternatives() {
        let err = ArchiveFormat::try_from("rar").expect_err("unsupported");
        let msg = err.to_string();
        assert!(msg.contains("rar"));
        assert!(msg.contains("zip, tar, tar.gz"));
    }
}
