//! Producing a package's artefact at its planned path.
//!
//! * **Pass-through**: the original dist file is fetched into a scratch
//!   directory and moved to the planned path unchanged.
//! * **Synthesize**: the backend prepares a checkout (or finds the archive
//!   already built), the pre-archive hook runs on the checkout, and the
//!   backend writes the archive.
//! * **Override**: synthesize, then move the archive to the planned path,
//!   whose name reflects the configured format as dist type.
//!
//! The package itself is never modified here.

use crate::backend::ArchiveBackend;
use crate::config::BuildConfig;
use crate::download::PackageDownloader;
use crate::error::{ArchiveError, Result};
use crate::filesystem::{ensure_dir, move_file, remove_dir, utf8_path};
use crate::hook::{ArchiveHook, PreArchiveDumpEvent};
use crate::output::OutputSink;
use crate::paths::{PathPlan, Strategy, url_basename};
use camino::{Utf8Path, Utf8PathBuf};
use satis::{PASS_THROUGH_DIST_TYPE, Package};

/// An artefact in place at its planned path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Produced {
    /// Where the artefact lives.
    pub path: Utf8PathBuf,
    /// The artefact existed before this run.
    pub reused: bool,
    /// Dist type to advertise for the artefact.
    pub dist_type: String,
}

/// Collaborators needed to produce artefacts.
pub struct ArchiveProducer<'a> {
    backend: &'a dyn ArchiveBackend,
    downloader: &'a dyn PackageDownloader,
    hook: &'a dyn ArchiveHook,
    output: &'a OutputSink,
    config: &'a BuildConfig,
}

impl<'a> ArchiveProducer<'a> {
    /// Producer over the given collaborators.
    #[must_use]
    pub fn new(
        backend: &'a dyn ArchiveBackend,
        downloader: &'a dyn PackageDownloader,
        hook: &'a dyn ArchiveHook,
        output: &'a OutputSink,
        config: &'a BuildConfig,
    ) -> Self {
        Self {
            backend,
            downloader,
            hook,
            output,
            config,
        }
    }

    /// Put `package`'s artefact at `plan.final_path`.
    ///
    /// # Errors
    ///
    /// Returns an error when fetching, the hook, archiving, or moving the
    /// result fails. No file is left at the final path in that case.
    pub fn produce(&self, package: &Package, plan: &PathPlan) -> Result<Produced> {
        match plan.strategy {
            Strategy::PassThrough => self.pass_through(package, plan),
            Strategy::Synthesize => {
                let (path, reused) = self.synthesize(package, &plan.target_dir)?;
                Ok(Produced {
                    path,
                    reused,
                    dist_type: self.config.format.as_str().to_owned(),
                })
            }
            Strategy::Override => self.synthesize_with_override(package, plan),
        }
    }

    fn pass_through(&self, package: &Package, plan: &PathPlan) -> Result<Produced> {
        let produced = |reused| Produced {
            path: plan.final_path.clone(),
            reused,
            dist_type: PASS_THROUGH_DIST_TYPE.to_owned(),
        };
        if plan.final_path.is_file() {
            return Ok(produced(true));
        }

        let dist = package.dist().ok_or_else(|| ArchiveError::Backend {
            reason: format!("pre-archived package {} has no dist URL", package.id()),
        })?;
        let scratch = tempfile::Builder::new()
            .prefix("satis_archiver_")
            .tempdir()
            .map_err(|e| ArchiveError::filesystem(Utf8Path::new("<temp dir>"), e))?;
        let scratch_path = utf8_path(scratch.path())?;

        self.downloader.fetch(package, &scratch_path, false)?;
        let basename = match url_basename(dist.url()) {
            "" => "download",
            name => name,
        };
        move_file(&scratch_path.join(basename), &plan.final_path)?;

        if let Err(e) = scratch.close() {
            log::warn!("failed to remove download directory {scratch_path}: {e}");
        }
        Ok(produced(false))
    }

    fn synthesize(&self, package: &Package, target_dir: &Utf8Path) -> Result<(Utf8PathBuf, bool)> {
        let format = self.config.format;
        let prepared = self.backend.prepare(package, format, target_dir)?;
        if prepared.is_target {
            self.output
                .writeln(format!("Reusing existing target: '{}'.", prepared.path));
            return Ok((prepared.path, true));
        }

        self.output.writeln(format!(
            "Executing {} on '{}'.",
            satis::PRE_ARCHIVE_DUMP_EVENT,
            prepared.path
        ));
        if let Err(e) = self.hook.dispatch(&PreArchiveDumpEvent::new(&prepared.path)) {
            if let Err(cleanup) = remove_dir(&prepared.path) {
                log::warn!("{cleanup}");
            }
            return Err(e.into());
        }

        let path = self.backend.dump(
            package,
            format,
            target_dir,
            &prepared.path,
            self.config.ignore_filters,
        )?;
        Ok((path, false))
    }

    fn synthesize_with_override(&self, package: &Package, plan: &PathPlan) -> Result<Produced> {
        let produced = |reused| Produced {
            path: plan.final_path.clone(),
            reused,
            dist_type: self.config.format.as_str().to_owned(),
        };
        ensure_dir(&plan.target_dir)?;
        if plan.final_path.is_file() {
            return Ok(produced(true));
        }

        let (path, _) = self.synthesize(package, &plan.target_dir)?;
        if path != plan.final_path {
            move_file(&path, &plan.final_path)?;
        }
        Ok(produced(false))
    }
}

#[cfg(test)]
#[path = "producer_tests.rs"]
mod tests;
