//! `satis-archive` CLI entrypoint.
//!
//! Loads the archive settings from `satis.json`, builds dist archives for a
//! resolved package set, and writes the packages back with their dist
//! records pointing at the new archives.

use camino::Utf8PathBuf;
use clap::Parser;
use satis::{PRE_ARCHIVE_DUMP_EVENT, SatisConfig, read_packages, write_packages};
use satis_archiver::backend::ArchiveManager;
use satis_archiver::builder::ArchiveBuilder;
use satis_archiver::cli::Cli;
use satis_archiver::config::BuildConfig;
use satis_archiver::download::DistDownloader;
use satis_archiver::error::CliError;
use satis_archiver::hook::{ArchiveHook, NoopHook, ScriptHook};
use satis_archiver::output::{OutputSink, Verbosity};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<(), CliError> {
    let satis = SatisConfig::load(&cli.config)?;
    let config = build_config(cli, &satis)?;
    let mut packages = read_packages(&cli.packages)?;

    let backend = ArchiveManager::new(Box::new(DistDownloader::new()), work_dir(cli));
    let scripts = ScriptHook::new(satis.scripts_for(PRE_ARCHIVE_DUMP_EVENT));
    let hook: Box<dyn ArchiveHook> = if scripts.is_empty() {
        Box::new(NoopHook)
    } else {
        Box::new(scripts)
    };
    let output = OutputSink::stderr(Verbosity::from_flags(cli.quiet, cli.verbose));
    let builder = ArchiveBuilder::new(
        config,
        Box::new(backend),
        Box::new(DistDownloader::new()),
        hook,
        output,
    );

    let report = builder.dump(&mut packages)?;
    write_packages(cli.output_packages(), &packages)?;

    if cli.stats && !cli.quiet {
        write_stderr_line(stderr, report.summary());
    }
    if report.has_failures() {
        return Err(CliError::PackagesFailed {
            failed: report.failed(),
        });
    }
    Ok(())
}

fn build_config(cli: &Cli, satis: &SatisConfig) -> Result<BuildConfig, CliError> {
    let mut config = BuildConfig::from_satis(satis, cli.output_dir.clone())?;
    config.skip_errors = cli.skip_errors;
    config.render_progress = cli.stats;
    config.seed = cli.seed;
    Ok(config)
}

fn work_dir(cli: &Cli) -> Utf8PathBuf {
    cli.work_dir.clone().unwrap_or_else(|| {
        let temp = std::env::temp_dir().join("satis-archive");
        Utf8PathBuf::from_path_buf(temp).unwrap_or_else(|_| Utf8PathBuf::from("satis-archive"))
    })
}

fn exit_code_for_run_result(result: Result<(), CliError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
