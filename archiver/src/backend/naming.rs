//! Archive file naming.
//!
//! The name identifies exactly what was archived: package name, then either
//! the dist commit and dist type (when the dist reference is a full commit
//! hash) or the pretty version and dist reference, then a short hash of the
//! source reference. Empty parts are dropped.

use satis::Package;
use sha1::{Digest, Sha1};

const COMMIT_HEX_LEN: usize = 40;
const SOURCE_HASH_LEN: usize = 6;

/// Compute the archive file name for `package`, without extension.
///
/// # Examples
///
/// ```
/// use satis::Package;
/// use satis_archiver::backend::naming::package_filename;
///
/// let package = Package::new("vendor/name", "1.2.3");
/// assert_eq!(package_filename(&package), "vendor-name-1.2.3");
/// ```
#[must_use]
pub fn package_filename(package: &Package) -> String {
    let mut parts = vec![sanitise(package.name())];

    let dist = package.dist();
    let dist_reference = dist.and_then(|d| d.reference()).unwrap_or_default();
    if is_commit_hash(dist_reference) {
        parts.push(dist_reference.to_owned());
        parts.push(dist.map(|d| d.kind().to_owned()).unwrap_or_default());
    } else {
        parts.push(package.pretty_version().to_owned());
        parts.push(dist_reference.to_owned());
    }

    if let Some(reference) = package.source_reference().filter(|r| !r.is_empty()) {
        let digest = format!("{:x}", Sha1::digest(reference.as_bytes()));
        parts.push(digest.chars().take(SOURCE_HASH_LEN).collect());
    }

    parts.retain(|part| !part.is_empty());
    parts.join("-").replace('/', "-")
}

fn sanitise(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn is_commit_hash(reference: &str) -> bool {
    reference.len() == COMMIT_HEX_LEN
        && reference
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use satis::{DistRecord, SourceRecord};

    const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

    fn source(reference: &str) -> SourceRecord {
        SourceRecord {
            kind: "git".to_owned(),
            url: "https://example.test/repo.git".to_owned(),
            reference: Some(reference.to_owned()),
        }
    }

    #[test]
    fn version_and_short_source_hash() {
        let package = Package::new("vendor/name", "1.2.3").with_source(source("v1.2.3"));
        let expected_hash: String = format!("{:x}", Sha1::digest(b"v1.2.3")).chars().take(6).collect();

        assert_eq!(package_filename(&package), format!("vendor-name-1.2.3-{expected_hash}"));
    }

    #[test]
    fn commit_dist_reference_uses_dist_type() {
        let package = Package::new("vendor/name", "dev-main")
            .with_dist(DistRecord::new("zip", "https://x.test/a.zip").with_reference(Some(COMMIT.to_owned())));

        assert_eq!(package_filename(&package), format!("vendor-name-{COMMIT}-zip"));
        assert_eq!(
            package_filename(&package.with_dist_kind("tar")),
            format!("vendor-name-{COMMIT}-tar")
        );
    }

    #[test]
    fn non_commit_dist_reference_follows_version() {
        let package = Package::new("vendor/name", "2.0.0")
            .with_dist(DistRecord::new("zip", "https://x.test/a.zip").with_reference(Some("tag-2".to_owned())));

        assert_eq!(package_filename(&package), "vendor-name-2.0.0-tag-2");
    }

    #[test]
    fn unsafe_name_characters_are_replaced() {
        let package = Package::new("vendor/name:weird name!", "1.2.3");
        assert_eq!(package_filename(&package), "vendor-name-weird-name--1.2.3");
    }

    #[test]
    fn slashes_in_versions_are_replaced() {
        let package = Package::new("vendor/name", "dev-feature/x");
        assert_eq!(package_filename(&package), "vendor-name-dev-feature-x");
    }
}
