//! Repository state capture.
//!
//! A [`RepositorySnapshot`] is an immutable read of everything the harness
//! validates: HEAD, branch, commit history, tags, and working-tree
//! cleanliness. Capturing never writes to the repository.

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::git::{git, git_ok, git_with_stdin};

/// One entry in the bounded recent-commit window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitEntry {
    /// Full commit hash
    pub id: String,
    /// First line of the commit message
    pub subject: String,
}

/// Options controlling what a capture records.
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Maximum number of recent commits recorded in the window
    pub window: usize,
    /// Whether to compute content-based patch identifiers for the window
    pub patch_ids: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            window: 50,
            patch_ids: false,
        }
    }
}

impl CaptureOptions {
    /// Enable patch-identifier computation for the commit window.
    pub fn with_patch_ids(mut self) -> Self {
        self.patch_ids = true;
        self
    }

    /// Set the recent-commit window size.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

/// Immutable record of a repository's observable state at one instant.
///
/// A repository with an unborn HEAD (no commits yet) is represented as an
/// explicitly empty snapshot (`head == None`) rather than an error, since
/// "no commits yet" is a legitimate pre-state for some scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySnapshot {
    /// Current branch name, if HEAD points at a branch
    pub branch: Option<String>,
    /// Full HEAD commit hash; `None` for an unborn HEAD
    pub head: Option<String>,
    /// Total number of commits reachable from HEAD
    pub commit_count: usize,
    /// Most recent commits, newest first, bounded by the capture window
    pub commits: Vec<CommitEntry>,
    /// All tag names, sorted
    pub tags: Vec<String>,
    /// Whether the working tree has no uncommitted changes
    pub clean: bool,
    /// Content-based patch identifiers for the window, newest first.
    /// Empty unless requested via [`CaptureOptions::with_patch_ids`].
    pub patch_ids: Vec<String>,
}

impl RepositorySnapshot {
    /// True if the repository had no commits at capture time.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// True if `tag` was present at capture time.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Capture the observable state of the repository at `path`.
///
/// Pure read: only `rev-parse`, `branch`, `rev-list`, `log`, `tag`,
/// `status` and `show`/`patch-id` plumbing are used.
///
/// # Errors
///
/// Returns [`Error::NotARepository`] if `path` is not a git repository.
pub fn capture(path: &Path, options: CaptureOptions) -> Result<RepositorySnapshot> {
    if !path.is_dir() || !git_ok(path, &["rev-parse", "--git-dir"])? {
        return Err(Error::NotARepository {
            path: path.to_path_buf(),
        });
    }

    let branch = match git(path, &["branch", "--show-current"])? {
        b if b.is_empty() => None,
        b => Some(b),
    };

    let mut tags: Vec<String> = git(path, &["tag", "-l"])?
        .lines()
        .map(str::to_string)
        .collect();
    tags.sort();

    let clean = git(path, &["status", "--porcelain"])?.is_empty();

    // Unborn HEAD: no commits yet, but still a valid pre-state.
    if !git_ok(path, &["rev-parse", "--verify", "--quiet", "HEAD"])? {
        tracing::debug!(path = %path.display(), "capturing empty repository");
        return Ok(RepositorySnapshot {
            branch,
            head: None,
            commit_count: 0,
            commits: Vec::new(),
            tags,
            clean,
            patch_ids: Vec::new(),
        });
    }

    let head = git(path, &["rev-parse", "HEAD"])?;
    let commit_count = parse_count(&git(path, &["rev-list", "--count", "HEAD"])?)?;

    let window = options.window.to_string();
    let commits: Vec<CommitEntry> = git(path, &["log", "-n", &window, "--format=%H%x09%s"])?
        .lines()
        .filter_map(|line| {
            let (id, subject) = line.split_once('\t')?;
            Some(CommitEntry {
                id: id.to_string(),
                subject: subject.to_string(),
            })
        })
        .collect();

    let patch_ids = if options.patch_ids {
        let mut ids = Vec::with_capacity(commits.len());
        for entry in &commits {
            if let Some(id) = patch_id(path, &entry.id)? {
                ids.push(id);
            }
        }
        ids
    } else {
        Vec::new()
    };

    Ok(RepositorySnapshot {
        branch,
        head: Some(head),
        commit_count,
        commits,
        tags,
        clean,
        patch_ids,
    })
}

/// Parse `rev-list --count` output. Anything non-numeric is an error, not
/// an empty history.
fn parse_count(output: &str) -> Result<usize> {
    output
        .trim()
        .parse()
        .map_err(|_| Error::UnexpectedOutput {
            args: "rev-list --count HEAD".to_string(),
            output: output.to_string(),
        })
}

/// Compute the content-based patch identifier of a single commit.
///
/// Uses `git patch-id --stable` over the commit's diff, the same primitive
/// the synchronization scripts rely on, so identifiers compare equal across
/// history rewrites that preserve a commit's content. Returns `None` for
/// commits with an empty diff (patch-id produces no output for those).
pub fn patch_id(path: &Path, commit: &str) -> Result<Option<String>> {
    let diff = git(path, &["show", commit])?;
    let out = git_with_stdin(path, &["patch-id", "--stable"], diff.as_bytes())?;
    Ok(out
        .split_whitespace()
        .next()
        .map(str::to_string)
        .filter(|s| !s.is_empty()))
}
