//! CLI argument definitions for `satis-archive`.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};

/// Build dist archives for a resolved Satis package set.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "satis-archive")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build dist archives for a resolved Satis package set.\n\n",
    "Reads the archive settings from satis.json, archives every package in the ",
    "packages file that the settings do not exclude, and rewrites each package's ",
    "dist record to point at its archive under the repository's public URL.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Archive into the configured output directory:\n",
    "    $ satis-archive satis.json packages.json\n\n",
    "  Keep going past broken packages, with a progress bar:\n",
    "    $ satis-archive satis.json packages.json --skip-errors --stats\n\n",
    "  Write the rewritten packages elsewhere:\n",
    "    $ satis-archive satis.json packages.json --write packages.archived.json",
))]
pub struct Cli {
    /// Path to satis.json.
    pub config: Utf8PathBuf,

    /// JSON array of resolved packages; rewritten in place unless --write is given.
    pub packages: Utf8PathBuf,

    /// Repository output directory [default: "output-dir" from satis.json].
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Write the rewritten packages to FILE.
    #[arg(short, long, value_name = "FILE")]
    pub write: Option<Utf8PathBuf>,

    /// Scratch directory for source checkouts [default: system temp dir].
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<Utf8PathBuf>,

    /// Log failing packages and continue.
    #[arg(long)]
    pub skip_errors: bool,

    /// Display a progress bar instead of one line per package, and a summary
    /// at the end.
    #[arg(long)]
    pub stats: bool,

    /// Seed for the processing order.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Suppress output.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase output detail (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Where the rewritten packages go.
    #[must_use]
    pub fn output_packages(&self) -> &Utf8PathBuf {
        self.write.as_ref().unwrap_or(&self.packages)
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
