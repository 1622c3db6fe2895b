//! Git checkouts of package sources.
//!
//! Clones run with a timeout so an unreachable remote cannot stall a build.

use crate::download::DownloadError;
use camino::Utf8Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default timeout for git operations (5 minutes).
pub const GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Clone `url` into `target` and check out `reference` when given.
///
/// `target` must be absent or empty.
///
/// # Errors
///
/// Returns [`DownloadError::Git`] if either command fails or times out.
pub fn checkout(
    url: &str,
    reference: Option<&str>,
    target: &Utf8Path,
    timeout: Duration,
) -> Result<(), DownloadError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let output = run_git_with_timeout(
        &["clone", "--quiet", "--no-checkout", url, target.as_str()],
        None,
        "clone",
        timeout,
    )?;
    ensure_success(&output, "clone")?;

    let reference = reference.unwrap_or("HEAD");
    let output = run_git_with_timeout(
        &["checkout", "--quiet", "--detach", reference],
        Some(target),
        "checkout",
        timeout,
    )?;
    ensure_success(&output, "checkout")
}

fn ensure_success(output: &Output, operation: &'static str) -> Result<(), DownloadError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(DownloadError::Git {
        operation,
        message: stderr.trim().to_owned(),
    })
}

/// Runs a git command with a timeout.
///
/// Returns the command output if it completes within the timeout, or an error
/// if the command times out or fails to start.
fn run_git_with_timeout(
    args: &[&str],
    working_dir: Option<&Utf8Path>,
    operation: &'static str,
    timeout: Duration,
) -> Result<Output, DownloadError> {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env("GIT_TERMINAL_PROMPT", "0");

    if let Some(dir) = working_dir {
        cmd.current_dir(dir.as_std_path());
    }

    let mut child = cmd.spawn().map_err(|e| DownloadError::Git {
        operation,
        message: format!("failed to start git: {e}"),
    })?;

    if let Some(status) = child.wait_timeout(timeout)? {
        let stdout = child
            .stdout
            .take()
            .map(std::io::read_to_string)
            .transpose()?
            .unwrap_or_default();
        let stderr = child
            .stderr
            .take()
            .map(std::io::read_to_string)
            .transpose()?
            .unwrap_or_default();

        return Ok(Output {
            status,
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
        });
    }

    let _ = child.kill();
    let _ = child.wait();
    Err(DownloadError::Git {
        operation,
        message: format!("operation timed out after {} seconds", timeout.as_secs()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_error_includes_operation() {
        let err = DownloadError::Git {
            operation: "checkout",
            message: "reference is not a tree".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("checkout"));
        assert!(msg.contains("reference is not a tree"));
    }

    #[test]
    fn clone_of_missing_repository_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("utf8");
        let missing = root.join("no-such-repo");

        let outcome = checkout(missing.as_str(), None, &root.join("checkout"), GIT_TIMEOUT);

        assert!(matches!(outcome, Err(DownloadError::Git { .. })));
    }
}
