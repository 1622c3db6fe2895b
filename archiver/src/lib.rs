//! Satis archive builder.
//!
//! Turns a resolved package set into locally hosted dist archives: each
//! package's source is checked out (or its dist fetched), packed into the
//! configured container format under the repository's output directory, and
//! its dist record rewritten to point at the new archive.
//!
//! # Modules
//!
//! - [`backend`] - Archive backend: checkout, file selection, and writing
//! - [`builder`] - Build orchestration over a package set
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Resolved build configuration
//! - [`dist`] - Dist record rewriting
//! - [`download`] - Fetching package dists and sources
//! - [`error`] - Semantic error types
//! - [`extract`] - Safe extraction of downloaded dist archives
//! - [`filesystem`] - Atomic moves and directory helpers
//! - [`format`] - Archive container formats
//! - [`git`] - Git checkouts with a timeout
//! - [`hook`] - The `pre-archive-dump-cmd` hook
//! - [`output`] - User-facing output with verbosity levels
//! - [`paths`] - Output path planning
//! - [`producer`] - Producing one package's artefact
//! - [`progress`] - Per-package progress reporting
//! - [`skip`] - Skip policy

pub mod backend;
pub mod builder;
pub mod cli;
pub mod config;
pub mod dist;
pub mod download;
pub mod error;
pub mod extract;
pub mod filesystem;
pub mod format;
pub mod git;
pub mod hook;
pub mod output;
pub mod paths;
pub mod producer;
pub mod progress;
pub mod skip;

#[cfg(test)]
mod test_utils;
