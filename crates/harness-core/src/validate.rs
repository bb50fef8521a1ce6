//! Predicate vocabulary and snapshot-pair validation.
//!
//! Validation is pure: it operates only on the immutable before/after
//! snapshots and the captured operation result, never re-querying the
//! repository. Every predicate is evaluated and reported — a failing
//! predicate never short-circuits the rest, so one run surfaces every
//! discrepancy.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

use harness_git::RepositorySnapshot;

use crate::error::{Error, Result};
use crate::runner::OperationResult;

/// One expectation over a (before, after, operation) triple.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Commit count changed by exactly `delta`
    CommitCountDelta { delta: i64 },
    /// Commit count grew by at least `min`
    CommitCountMinDelta { min: i64 },
    /// HEAD identifier differs between snapshots
    HeadChanged,
    /// HEAD identifier is unchanged
    HeadUnchanged,
    /// Every tag present before is still present after
    NoTagsRemoved,
    /// A tag matching `pattern` exists after and did not before
    TagAdded { pattern: String },
    /// The newest `count` patch identifiers from before all occur after
    PatchesPreserved { count: usize },
    /// Working tree is clean after the operation
    CleanWorktree,
    /// The operation exited with exactly `code`
    ExitCode { code: i32 },
    /// The operation exited non-zero (expected-failure scenarios)
    ExitNonzero,
    /// Commit count, HEAD and tag set are all unchanged (dry-run no-op)
    SnapshotUnchanged,
}

impl Predicate {
    /// Stable name used in scenario files and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CommitCountDelta { .. } => "commit-count-delta",
            Self::CommitCountMinDelta { .. } => "commit-count-min-delta",
            Self::HeadChanged => "head-changed",
            Self::HeadUnchanged => "head-unchanged",
            Self::NoTagsRemoved => "no-tags-removed",
            Self::TagAdded { .. } => "tag-added",
            Self::PatchesPreserved { .. } => "patches-preserved",
            Self::CleanWorktree => "clean-worktree",
            Self::ExitCode { .. } => "exit-code",
            Self::ExitNonzero => "exit-nonzero",
            Self::SnapshotUnchanged => "snapshot-unchanged",
        }
    }

    /// Resolve a predicate by name with its parameters.
    ///
    /// Unknown names fail closed with [`Error::UnknownPredicate`] so a
    /// typo in a scenario file can never produce a false pass.
    pub fn parse(name: &str, params: &toml::Value) -> Result<Self> {
        let int = |key: &str| -> Result<i64> {
            params
                .get(key)
                .and_then(toml::Value::as_integer)
                .ok_or_else(|| {
                    Error::scenario(format!("predicate '{name}' requires integer '{key}'"))
                })
        };
        let string = |key: &str| -> Result<String> {
            params
                .get(key)
                .and_then(toml::Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::scenario(format!("predicate '{name}' requires string '{key}'"))
                })
        };

        match name {
            "commit-count-delta" => Ok(Self::CommitCountDelta { delta: int("delta")? }),
            "commit-count-min-delta" => Ok(Self::CommitCountMinDelta { min: int("min")? }),
            "head-changed" => Ok(Self::HeadChanged),
            "head-unchanged" => Ok(Self::HeadUnchanged),
            "no-tags-removed" => Ok(Self::NoTagsRemoved),
            "tag-added" => Ok(Self::TagAdded {
                pattern: string("pattern")?,
            }),
            "patches-preserved" => Ok(Self::PatchesPreserved {
                count: int("count")?.max(0) as usize,
            }),
            "clean-worktree" => Ok(Self::CleanWorktree),
            "exit-code" => Ok(Self::ExitCode {
                code: int("code")? as i32,
            }),
            "exit-nonzero" => Ok(Self::ExitNonzero),
            "snapshot-unchanged" => Ok(Self::SnapshotUnchanged),
            other => Err(Error::UnknownPredicate {
                name: other.to_string(),
            }),
        }
    }
}

/// An ordered set of predicates that must all hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectation {
    predicates: Vec<Predicate>,
}

impl Expectation {
    /// Create an empty expectation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate.
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// The predicates, in declaration order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Whether evaluating this expectation needs patch identifiers in the
    /// snapshots.
    pub fn needs_patch_ids(&self) -> bool {
        self.predicates
            .iter()
            .any(|p| matches!(p, Predicate::PatchesPreserved { .. }))
    }
}

impl FromIterator<Predicate> for Expectation {
    fn from_iter<T: IntoIterator<Item = Predicate>>(iter: T) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

/// Outcome of one predicate, with expected/actual detail for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct PredicateOutcome {
    pub name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

/// Conjunction of all predicate outcomes for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// True iff every predicate held
    pub passed: bool,
    /// One outcome per declared predicate, in declaration order
    pub outcomes: Vec<PredicateOutcome>,
}

/// Evaluate every predicate of `expectation` against the snapshot pair and
/// the operation result.
pub fn validate(
    before: &RepositorySnapshot,
    after: &RepositorySnapshot,
    operation: &OperationResult,
    expectation: &Expectation,
) -> ValidationResult {
    let outcomes: Vec<PredicateOutcome> = expectation
        .predicates()
        .iter()
        .map(|p| evaluate(p, before, after, operation))
        .collect();
    let passed = outcomes.iter().all(|o| o.passed);
    ValidationResult { passed, outcomes }
}

fn evaluate(
    predicate: &Predicate,
    before: &RepositorySnapshot,
    after: &RepositorySnapshot,
    operation: &OperationResult,
) -> PredicateOutcome {
    let (passed, expected, actual) = match predicate {
        Predicate::CommitCountDelta { delta } => {
            let want = before.commit_count as i64 + delta;
            let got = after.commit_count as i64;
            (
                got == want,
                format!("commit count {want} ({} {delta:+})", before.commit_count),
                format!("commit count {got}"),
            )
        }
        Predicate::CommitCountMinDelta { min } => {
            let want = before.commit_count as i64 + min;
            let got = after.commit_count as i64;
            (
                got >= want,
                format!("commit count >= {want}"),
                format!("commit count {got}"),
            )
        }
        Predicate::HeadChanged => (
            before.head != after.head,
            format!("HEAD != {}", display_head(before)),
            format!("HEAD {}", display_head(after)),
        ),
        Predicate::HeadUnchanged => (
            before.head == after.head,
            format!("HEAD == {}", display_head(before)),
            format!("HEAD {}", display_head(after)),
        ),
        Predicate::NoTagsRemoved => {
            let after_set: HashSet<&str> = after.tags.iter().map(String::as_str).collect();
            let removed: Vec<&str> = before
                .tags
                .iter()
                .map(String::as_str)
                .filter(|t| !after_set.contains(t))
                .collect();
            (
                removed.is_empty(),
                format!("all {} pre-existing tags retained", before.tags.len()),
                if removed.is_empty() {
                    "no tags removed".to_string()
                } else {
                    format!("tags removed: {}", removed.join(", "))
                },
            )
        }
        Predicate::TagAdded { pattern } => match Regex::new(pattern) {
            Ok(re) => {
                let added: Vec<&str> = after
                    .tags
                    .iter()
                    .map(String::as_str)
                    .filter(|t| re.is_match(t) && !before.has_tag(t))
                    .collect();
                (
                    !added.is_empty(),
                    format!("new tag matching /{pattern}/"),
                    if added.is_empty() {
                        format!("no new tag among [{}]", after.tags.join(", "))
                    } else {
                        format!("new tags: {}", added.join(", "))
                    },
                )
            }
            Err(e) => (
                false,
                format!("new tag matching /{pattern}/"),
                format!("invalid pattern: {e}"),
            ),
        },
        Predicate::PatchesPreserved { count } => {
            let after_set: HashSet<&str> = after.patch_ids.iter().map(String::as_str).collect();
            let missing = before
                .patch_ids
                .iter()
                .take(*count)
                .filter(|id| !after_set.contains(id.as_str()))
                .count();
            let checked = before.patch_ids.len().min(*count);
            (
                missing == 0 && checked == *count,
                format!("{count} newest patch ids preserved"),
                format!("{} of {checked} preserved", checked - missing),
            )
        }
        Predicate::CleanWorktree => (
            after.clean,
            "clean working tree".to_string(),
            if after.clean {
                "clean".to_string()
            } else {
                "uncommitted changes present".to_string()
            },
        ),
        Predicate::ExitCode { code } => (
            operation.exit_code == *code,
            format!("exit code {code}"),
            format!("exit code {}", operation.exit_code),
        ),
        Predicate::ExitNonzero => (
            operation.exit_code != 0,
            "non-zero exit code".to_string(),
            format!("exit code {}", operation.exit_code),
        ),
        Predicate::SnapshotUnchanged => {
            let same = before.commit_count == after.commit_count
                && before.head == after.head
                && before.tags == after.tags;
            (
                same,
                "identical commit count, HEAD and tags".to_string(),
                if same {
                    "unchanged".to_string()
                } else {
                    format!(
                        "count {} -> {}, HEAD {} -> {}, tags {} -> {}",
                        before.commit_count,
                        after.commit_count,
                        display_head(before),
                        display_head(after),
                        before.tags.len(),
                        after.tags.len()
                    )
                },
            )
        }
    };

    PredicateOutcome {
        name: predicate.name().to_string(),
        passed,
        expected,
        actual,
    }
}

fn display_head(snapshot: &RepositorySnapshot) -> String {
    match &snapshot.head {
        Some(head) => head.chars().take(10).collect(),
        None => "(empty)".to_string(),
    }
}
