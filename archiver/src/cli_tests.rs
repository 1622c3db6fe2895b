//! Tests for `satis-archive` argument parsing.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["satis-archive", "satis.json", "packages.json"]);
    assert_eq!(cli.config, Utf8PathBuf::from("satis.json"));
    assert_eq!(cli.packages, Utf8PathBuf::from("packages.json"));
    assert!(cli.output_dir.is_none());
    assert!(cli.write.is_none());
    assert!(cli.work_dir.is_none());
    assert!(!cli.skip_errors);
    assert!(!cli.stats);
    assert!(cli.seed.is_none());
    assert!(!cli.quiet);
    assert_eq!(cli.verbose, 0);
    assert_eq!(cli.output_packages(), &cli.packages);
}

#[test]
fn cli_parses_build_flags() {
    let cli = Cli::parse_from([
        "satis-archive",
        "satis.json",
        "packages.json",
        "-o",
        "/srv/repo",
        "--write",
        "out.json",
        "--skip-errors",
        "--stats",
        "--seed",
        "42",
    ]);
    assert_eq!(cli.output_dir, Some(Utf8PathBuf::from("/srv/repo")));
    assert_eq!(cli.output_packages(), &Utf8PathBuf::from("out.json"));
    assert!(cli.skip_errors && cli.stats);
    assert_eq!(cli.seed, Some(42));
}

#[rstest]
#[case::single(&["-v"], 1)]
#[case::double(&["-vv"], 2)]
#[case::long(&["--verbose", "--verbose", "--verbose"], 3)]
fn cli_counts_verbosity(#[case] flags: &[&str], #[case] expected: u8) {
    let args = ["satis-archive", "a.json", "b.json"].iter().chain(flags);
    let cli = Cli::parse_from(args);
    assert_eq!(cli.verbose, expected);
}

#[test]
fn cli_rejects_quiet_with_verbose() {
    let result = Cli::try_parse_from(["satis-archive", "a.json", "b.json", "-q", "-v"]);
    assert!(result.is_err());
}

#[test]
fn cli_requires_both_paths() {
    assert!(Cli::try_parse_from(["satis-archive", "satis.json"]).is_err());
}
