//! The archive build orchestrator.
//!
//! [`ArchiveBuilder::dump`] walks the package set in shuffled order, skips
//! what [`should_skip`] rules out, produces every other package's artefact and
//! rewrites its dist record. A failing package either aborts the run or, with
//! skip-errors, is logged and left unchanged.

use crate::backend::ArchiveBackend;
use crate::config::BuildConfig;
use crate::dist;
use crate::download::PackageDownloader;
use crate::error::{ArchiveError, BuildError};
use crate::hook::ArchiveHook;
use crate::output::OutputSink;
use crate::paths;
use crate::producer::ArchiveProducer;
use crate::progress::ProgressReporter;
use crate::skip::{SkipReason, should_skip};
use camino::Utf8Path;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use satis::{Package, PackageId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What happened to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A new artefact was written.
    Produced,
    /// An artefact from an earlier run was kept.
    Reused,
    /// The package was not processed.
    Skipped(SkipReason),
    /// Processing failed and skip-errors was on.
    Failed {
        /// Error category.
        kind: &'static str,
        /// Error message.
        message: String,
    },
}

/// Per-package outcomes of a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    outcomes: Vec<(PackageId, BuildOutcome)>,
}

impl BuildReport {
    fn record(&mut self, package: PackageId, outcome: BuildOutcome) {
        self.outcomes.push((package, outcome));
    }

    /// All outcomes.
    #[must_use]
    pub fn outcomes(&self) -> &[(PackageId, BuildOutcome)] {
        &self.outcomes
    }

    /// Outcome for the package with `name` and pretty `version`.
    #[must_use]
    pub fn outcome_of(&self, name: &str, version: &str) -> Option<&BuildOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id.name() == name && id.version() == version)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, predicate: impl Fn(&BuildOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| predicate(outcome)).count()
    }

    /// Packages with a newly written artefact.
    #[must_use]
    pub fn produced(&self) -> usize {
        self.count(|o| matches!(o, BuildOutcome::Produced))
    }

    /// Packages whose existing artefact was kept.
    #[must_use]
    pub fn reused(&self) -> usize {
        self.count(|o| matches!(o, BuildOutcome::Reused))
    }

    /// Packages skipped by policy.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, BuildOutcome::Skipped(_)))
    }

    /// Packages that failed under skip-errors.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BuildOutcome::Failed { .. }))
    }

    /// Whether any package failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// One-line summary for the end of a run.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} package(s): {} archived, {} reused, {} skipped, {} failed",
            self.outcomes.len(),
            self.produced(),
            self.reused(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Cooperative cancellation shared with the caller, checked between
/// packages.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// A flag that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builds archives for a package set.
pub struct ArchiveBuilder {
    config: BuildConfig,
    backend: Box<dyn ArchiveBackend>,
    downloader: Box<dyn PackageDownloader>,
    hook: Box<dyn ArchiveHook>,
    output: OutputSink,
    cancellation: CancellationFlag,
}

impl ArchiveBuilder {
    /// Builder over the given configuration and collaborators.
    #[must_use]
    pub fn new(
        config: BuildConfig,
        backend: Box<dyn ArchiveBackend>,
        downloader: Box<dyn PackageDownloader>,
        hook: Box<dyn ArchiveHook>,
        output: OutputSink,
    ) -> Self {
        Self {
            config,
            backend,
            downloader,
            hook,
            output,
            cancellation: CancellationFlag::default(),
        }
    }

    /// Observe `flag` between packages.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// The run's configuration.
    #[must_use]
    pub const fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The run's output sink.
    #[must_use]
    pub const fn output(&self) -> &OutputSink {
        &self.output
    }

    /// Archive `packages`, rewriting the dist record of each one processed.
    ///
    /// The slice keeps its order; only the processing order is shuffled.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::OutputDirectory`] if the archive directory cannot
    /// be created, [`BuildError::Package`] for the first failure when
    /// skip-errors is off, and [`BuildError::Cancelled`] when the
    /// cancellation flag is raised. Packages processed before the error keep
    /// their rewritten dists.
    pub fn dump(&self, packages: &mut [Package]) -> Result<BuildReport, BuildError> {
        let base_dir = self.config.base_dir();
        std::fs::create_dir_all(&base_dir).map_err(|source| BuildError::OutputDirectory {
            path: base_dir.clone(),
            source,
        })?;
        self.output
            .writeln(format!("Creating local downloads in '{base_dir}'"));

        let decisions: Vec<Option<SkipReason>> = packages
            .iter()
            .map(|package| should_skip(package, &self.config, &base_dir))
            .collect();
        let total = decisions.iter().filter(|d| d.is_none()).count();
        let mut reporter = ProgressReporter::new(self.config.render_progress, &self.output, total);
        let mut report = BuildReport::default();
        let mut processed = 0;

        for index in processing_order(packages.len(), self.config.seed) {
            let (Some(package), Some(decision)) = (packages.get_mut(index), decisions.get(index)) else {
                continue;
            };
            if let Some(reason) = decision {
                log::debug!("skipping {}: {reason}", package.id());
                report.record(package.id(), BuildOutcome::Skipped(*reason));
                continue;
            }
            if self.cancellation.is_cancelled() {
                reporter.interrupt(&self.output);
                return Err(BuildError::Cancelled { processed });
            }

            reporter.begin(package, &self.output);
            let result = self
                .output
                .with_suppressed_ancillary_output(reporter.is_rich(), || {
                    self.archive_package(package, &base_dir)
                });
            processed += 1;

            match result {
                Ok(outcome) => report.record(package.id(), outcome),
                Err(source) if self.config.skip_errors => {
                    reporter.interrupt(&self.output);
                    self.report_skipped_failure(package, &source);
                    report.record(
                        package.id(),
                        BuildOutcome::Failed {
                            kind: source.kind(),
                            message: source.to_string(),
                        },
                    );
                }
                Err(source) => {
                    reporter.interrupt(&self.output);
                    return Err(BuildError::Package {
                        package: package.id(),
                        source,
                    });
                }
            }
            reporter.advance(&self.output);
        }

        reporter.finish(&self.output);
        Ok(report)
    }

    fn archive_package(&self, package: &mut Package, base_dir: &Utf8Path) -> Result<BuildOutcome, ArchiveError> {
        let plan = paths::plan(package, &self.config, base_dir, self.backend.as_ref())?;
        let producer = ArchiveProducer::new(
            self.backend.as_ref(),
            self.downloader.as_ref(),
            self.hook.as_ref(),
            &self.output,
            &self.config,
        );
        let produced = producer.produce(package, &plan)?;
        dist::apply(package, &plan, &produced, &self.config)?;
        Ok(if produced.reused {
            BuildOutcome::Reused
        } else {
            BuildOutcome::Produced
        })
    }

    fn report_skipped_failure(&self, package: &Package, error: &ArchiveError) {
        log::warn!("skipping {} after {} error: {error}", package.id(), error.kind());
        self.output
            .writeln(format!("Skipping Exception '{error}' for package '{}'.", package.id()));
    }
}

/// Indices `0..len` in shuffled order; the same seed gives the same order.
#[must_use]
pub fn processing_order(len: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut rng);
    order
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
