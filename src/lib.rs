//! Core Satis library: the package model shared by the repository builders
//! and the `satis.json` configuration schema.
//!
//! # Modules
//!
//! - [`config`] - `satis.json` schema and loader
//! - [`error`] - Configuration and package file errors
//! - [`package`] - Package, source, and dist records

pub mod config;
pub mod error;
pub mod package;

pub use config::{ArchiveConfig, PRE_ARCHIVE_DUMP_EVENT, SatisConfig, ScriptCommands};
pub use error::{ConfigError, PackageFileError};
pub use package::{
    DistRecord, METAPACKAGE_TYPE, PASS_THROUGH_DIST_TYPE, PRE_ARCHIVED_TYPE, Package, PackageId,
    SourceRecord, read_packages, write_packages,
};
