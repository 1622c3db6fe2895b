//! The `pre-archive-dump-cmd` hook.
//!
//! Fired after a package's source is checked out and before it is written to
//! an archive, so scripts can adjust the checkout. [`ScriptHook`] runs the
//! commands configured under `scripts` in `satis.json` with the checkout as
//! working directory.

use camino::{Utf8Path, Utf8PathBuf};
use satis::PRE_ARCHIVE_DUMP_EVENT;
use std::process::{Command, Stdio};

/// Environment variable carrying the checkout path to hook scripts.
pub const ARCHIVE_PATH_ENV: &str = "SATIS_ARCHIVE_PATH";

/// Event dispatched before a checkout is archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreArchiveDumpEvent {
    name: &'static str,
    path: Utf8PathBuf,
}

impl PreArchiveDumpEvent {
    /// Event for the checkout at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: PRE_ARCHIVE_DUMP_EVENT,
            path: path.into(),
        }
    }

    /// Event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The prepared checkout.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// Errors raised by hook listeners.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// A script could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A script exited unsuccessfully.
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        /// The command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Trimmed stderr.
        stderr: String,
    },
}

/// Receives [`PreArchiveDumpEvent`]s.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveHook {
    /// Handle the event.
    ///
    /// # Errors
    ///
    /// Returns an error to abort archiving of the package.
    fn dispatch(&self, event: &PreArchiveDumpEvent) -> Result<(), HookError>;
}

/// Hook with no listeners.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl ArchiveHook for NoopHook {
    fn dispatch(&self, _event: &PreArchiveDumpEvent) -> Result<(), HookError> {
        Ok(())
    }
}

/// Runs shell commands for the event, in order, stopping at the first
/// failure.
#[derive(Debug, Clone, Default)]
pub struct ScriptHook {
    commands: Vec<String>,
}

impl ScriptHook {
    /// Hook running `commands`.
    #[must_use]
    pub const fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    /// Whether any command is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn shell(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

impl ArchiveHook for ScriptHook {
    fn dispatch(&self, event: &PreArchiveDumpEvent) -> Result<(), HookError> {
        for command in &self.commands {
            log::debug!("running {} script: {command}", event.name());
            let output = Self::shell(command)
                .current_dir(event.path())
                .env(ARCHIVE_PATH_ENV, event.path())
                .stdin(Stdio::null())
                .output()
                .map_err(|source| HookError::Spawn {
                    command: command.clone(),
                    source,
                })?;
            if !output.status.success() {
                return Err(HookError::Failed {
                    command: command.clone(),
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                });
            }
        }
        Ok(())
    }
}
