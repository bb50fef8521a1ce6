//! Thin wrapper over the `git` executable.
//!
//! Every repository operation in the harness goes through these helpers;
//! the harness depends only on git's textual output, never on a library
//! binding, so results match what the scripts under test observe.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Run a git subcommand in `cwd` and return its trimmed stdout.
///
/// Fails with [`Error::CommandFailed`] on a non-zero exit.
pub fn git(cwd: &Path, args: &[&str]) -> Result<String> {
    tracing::debug!(?args, cwd = %cwd.display(), "git");
    let output = Command::new("git").args(args).current_dir(cwd).output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    } else {
        Err(Error::CommandFailed {
            args: args.join(" "),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}

/// Run a git subcommand and report only whether it succeeded.
///
/// Used for probes where a non-zero exit is an answer, not an error
/// (e.g. `rev-parse --verify HEAD` on an unborn branch).
pub fn git_ok(cwd: &Path, args: &[&str]) -> Result<bool> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    Ok(output.success())
}

/// Run a git subcommand with `input` piped to its stdin, returning stdout.
///
/// Needed for plumbing that reads a stream, such as `git patch-id`.
pub fn git_with_stdin(cwd: &Path, args: &[&str], input: &[u8]) -> Result<String> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(input)?;
    }

    let output = child.wait_with_output()?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    } else {
        Err(Error::CommandFailed {
            args: args.join(" "),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}
