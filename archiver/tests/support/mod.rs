//! Test support for archive builder behavioural tests.
//!
//! [`FixtureDownloader`] stands in for network and git access: it writes a
//! small PHP library into the checkout directory, or an opaque tarball for
//! pre-archived packages.

use camino::Utf8Path;
use satis::Package;
use satis_archiver::download::{DownloadError, PackageDownloader};
use satis_archiver::paths::url_basename;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Bytes served for every pre-archived dist.
pub const PEAR_TARBALL: &[u8] = b"\x1f\x8b\x08pear tarball";

/// Files every fixture library ships with.
pub const LIBRARY_FILES: &[(&str, &str)] = &[
    ("composer.json", "{\"name\": \"fixture\"}\n"),
    (".gitattributes", "/tests export-ignore\n"),
    ("src/Widget.php", "<?php\nfinal class Widget {}\n"),
    ("tests/WidgetTest.php", "<?php\nfinal class WidgetTest {}\n"),
];

/// Downloader writing fixture content; clones share their state.
#[derive(Clone, Default)]
pub struct FixtureDownloader {
    failing: Rc<RefCell<Vec<String>>>,
    fetches: Rc<Cell<usize>>,
}

impl FixtureDownloader {
    /// Make every fetch of `name` fail.
    pub fn fail_for(&self, name: &str) {
        self.failing.borrow_mut().push(name.to_owned());
    }

    /// Fetches attempted so far.
    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl PackageDownloader for FixtureDownloader {
    fn fetch(&self, package: &Package, dest: &Utf8Path, _prefer_source: bool) -> Result<(), DownloadError> {
        self.fetches.set(self.fetches.get() + 1);
        if self.failing.borrow().iter().any(|name| name == package.name()) {
            return Err(DownloadError::NotFound {
                url: format!("https://git.example.org/{}.git", package.name()),
            });
        }

        if let Some(dist) = package.dist().filter(|_| package.is_pre_archived()) {
            std::fs::write(dest.join(url_basename(dist.url())), PEAR_TARBALL)?;
            return Ok(());
        }

        for (relative, contents) in LIBRARY_FILES {
            let path = dest.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }
        Ok(())
    }
}
