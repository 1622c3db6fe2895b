//! Selection of the files that go into an archive.
//!
//! Version-control metadata is never archived. Unless filters are ignored,
//! `export-ignore` entries from the root `.gitattributes` apply first, then
//! the package's own `archive.exclude` patterns. Patterns are globs: a leading
//! `/` anchors at the package root, otherwise they match at any depth, and a
//! leading `!` re-includes. A rule matching a directory covers everything
//! beneath it, and the last matching rule wins. Symlinks are archived only
//! when they resolve to a file inside the package.

use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io;
use std::path::Path;

/// Directory names that are never archived.
pub const VCS_DIRECTORIES: [&str; 9] = [
    ".svn",
    "_svn",
    "CVS",
    "_darcs",
    ".arch-params",
    ".monotone",
    ".bzr",
    ".git",
    ".hg",
];

const GITATTRIBUTES: &str = ".gitattributes";
const EXPORT_IGNORE: &str = "export-ignore";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    anchored: bool,
    negated: bool,
}

impl Rule {
    fn parse(raw: &str) -> Option<Self> {
        let (negated, rest) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start_matches('!')),
            None => (false, raw),
        };
        let anchored = rest.starts_with('/');
        let body = rest.trim_matches('/');
        if body.is_empty() {
            return None;
        }
        match Pattern::new(body) {
            Ok(pattern) => Some(Self {
                pattern,
                anchored,
                negated,
            }),
            Err(e) => {
                log::warn!("ignoring invalid exclude pattern {raw:?}: {e}");
                None
            }
        }
    }

    fn matches(&self, components: &[&str]) -> bool {
        (1..=components.len()).any(|end| {
            let Some(prefix) = components.get(..end) else {
                return false;
            };
            if self.anchored {
                self.pattern.matches_with(&prefix.join("/"), MATCH_OPTIONS)
            } else {
                (0..end).any(|start| {
                    prefix
                        .get(start..)
                        .is_some_and(|tail| self.pattern.matches_with(&tail.join("/"), MATCH_OPTIONS))
                })
            }
        })
    }
}

/// Ordered exclude rules for one package.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    rules: Vec<Rule>,
}

impl ExcludeRules {
    /// Rules from `root/.gitattributes` followed by `excludes`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `.gitattributes` exists but cannot be read.
    pub fn from_sources(root: &Utf8Path, excludes: &[String]) -> io::Result<Self> {
        let mut rules = Self::default();
        match fs::read_to_string(root.join(GITATTRIBUTES)) {
            Ok(contents) => {
                for line in contents.lines() {
                    rules.push_gitattributes_line(line);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        for exclude in excludes {
            rules.push(exclude);
        }
        Ok(rules)
    }

    /// Append one exclude pattern.
    pub fn push(&mut self, pattern: &str) {
        if let Some(rule) = Rule::parse(pattern.trim()) {
            self.rules.push(rule);
        }
    }

    fn push_gitattributes_line(&mut self, line: &str) {
        let line = line.trim();
        if line.starts_with('#') {
            return;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [path, attribute] if *attribute == EXPORT_IGNORE => self.push(path),
            [path, attribute] if attribute.strip_prefix('-') == Some(EXPORT_IGNORE) => {
                self.push(&format!("!{path}"));
            }
            _ => {}
        }
    }

    /// Whether the `/`-separated relative path is excluded.
    #[must_use]
    pub fn is_excluded(&self, relative: &str) -> bool {
        let components: Vec<&str> = relative.split('/').filter(|c| !c.is_empty()).collect();
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(&components))
            .is_some_and(|rule| !rule.negated)
    }
}

/// Relative paths of the files under `root` that belong in the archive,
/// sorted for reproducible archives.
///
/// # Errors
///
/// Returns an I/O error if the tree cannot be read.
pub fn archivable_files(
    root: &Utf8Path,
    excludes: &[String],
    ignore_filters: bool,
) -> io::Result<Vec<Utf8PathBuf>> {
    let rules = if ignore_filters {
        ExcludeRules::default()
    } else {
        ExcludeRules::from_sources(root, excludes)?
    };

    let mut files = Vec::new();
    let canonical_root = fs::canonicalize(root)?;
    collect(root, &canonical_root, Utf8Path::new(""), &mut files)?;
    files.retain(|relative| !rules.is_excluded(relative.as_str()));
    files.sort();
    Ok(files)
}

fn collect(
    root: &Utf8Path,
    canonical_root: &Path,
    relative: &Utf8Path,
    files: &mut Vec<Utf8PathBuf>,
) -> io::Result<()> {
    for entry in fs::read_dir(root.join(relative))? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            log::warn!("skipping non-UTF-8 entry in {}", root.join(relative));
            continue;
        };
        let child = relative.join(&name);
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if !VCS_DIRECTORIES.contains(&name.as_str()) {
                collect(root, canonical_root, &child, files)?;
            }
        } else if file_type.is_file() {
            files.push(child);
        } else if file_type.is_symlink() {
            if links_to_file_inside(&root.join(&child), canonical_root) {
                files.push(child);
            } else {
                log::warn!("skipping {child}: symlink does not resolve to a file inside the package");
            }
        } else {
            log::debug!("skipping {child}: not a regular file");
        }
    }
    Ok(())
}

fn links_to_file_inside(link: &Utf8Path, canonical_root: &Path) -> bool {
    fs::canonicalize(link)
        .is_ok_and(|target| target.starts_with(canonical_root) && target.is_file())
}
