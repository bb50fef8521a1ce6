//! Built-in scenario suites for the rebase and squash scripts.
//!
//! These mirror the automated coverage the synchronization scripts ship
//! with: single and batch rebase syncs, no-op detection, conflict
//! handling, and the squash flows including dry runs.

use std::path::PathBuf;

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::fixture::{Side, Topology};
use crate::runner::Operation;
use crate::scenario::{Scenario, SetupStep};
use crate::validate::Predicate;

/// Script names inside the configured scripts directory.
const REBASE_SCRIPT: &str = "rebase-community-batch.sh";
const SQUASH_SCRIPT: &str = "squash-enterprise-patches.sh";

fn script_path(ctx: &RunContext, name: &str) -> Result<PathBuf> {
    let dir = ctx
        .scripts_dir()
        .ok_or_else(|| Error::fixture("scripts directory not configured"))?;
    let path = dir.join(name);
    if !path.exists() {
        return Err(Error::fixture(format!(
            "script not found: {}",
            path.display()
        )));
    }
    Ok(path)
}

fn rebase_op(ctx: &RunContext, max_commits: usize) -> Result<Operation> {
    Ok(Operation::new("rebase", script_path(ctx, REBASE_SCRIPT)?)
        .arg("--skip-validation")
        .arg("--max-commits")
        .arg(max_commits.to_string())
        .timeout(ctx.timeout()))
}

fn squash_op(ctx: &RunContext, dry_run: bool) -> Result<Operation> {
    let mut op = Operation::new("squash", script_path(ctx, SQUASH_SCRIPT)?);
    op = if dry_run {
        op.arg("--dry-run")
    } else {
        op.arg("--force")
    };
    Ok(op
        .arg("-m")
        .arg("test: squashed enterprise patches")
        .timeout(ctx.timeout()))
}

/// Scenarios exercising the rebase-style synchronization script.
pub fn rebase_suite(ctx: &RunContext) -> Result<Vec<Scenario>> {
    let base = Topology {
        community_commits: 4,
        enterprise_patches: 2,
    };

    Ok(vec![
        Scenario::new("rebase-single-commit", rebase_op(ctx, 1)?)
            .topology(base)
            .setup(SetupStep::AddCommits {
                side: Side::Community,
                count: 1,
            })
            .expect(Predicate::ExitCode { code: 0 })
            .expect(Predicate::CommitCountDelta { delta: 1 })
            .expect(Predicate::HeadChanged)
            .expect(Predicate::PatchesPreserved { count: 2 })
            .expect(Predicate::NoTagsRemoved)
            .expect(Predicate::CleanWorktree),
        Scenario::new("rebase-batch", rebase_op(ctx, 3)?)
            .topology(Topology {
                community_commits: 2,
                enterprise_patches: 2,
            })
            .setup(SetupStep::AddCommits {
                side: Side::Community,
                count: 3,
            })
            .expect(Predicate::ExitCode { code: 0 })
            .expect(Predicate::CommitCountDelta { delta: 3 })
            .expect(Predicate::HeadChanged)
            .expect(Predicate::PatchesPreserved { count: 2 })
            .expect(Predicate::NoTagsRemoved)
            .expect(Predicate::CleanWorktree),
        // Nothing new upstream: the script must be a provable no-op.
        Scenario::new("rebase-no-op", rebase_op(ctx, 5)?)
            .topology(base)
            .expect(Predicate::ExitCode { code: 0 })
            .expect(Predicate::SnapshotUnchanged),
        // Conflicting edits on both sides: the script is expected to fail,
        // and that non-zero exit is this scenario's success condition.
        Scenario::new("rebase-conflict", rebase_op(ctx, 1)?)
            .topology(base)
            .setup(SetupStep::AddFile {
                side: Side::Community,
                file: "conflict.txt".to_string(),
                content: "community version\n".to_string(),
                message: "feat: community conflict edit".to_string(),
            })
            .setup(SetupStep::AddFile {
                side: Side::Enterprise,
                file: "conflict.txt".to_string(),
                content: "enterprise version\n".to_string(),
                message: "feat: enterprise conflict edit".to_string(),
            })
            .expect(Predicate::ExitNonzero),
    ])
}

/// Scenarios exercising the squash-style synchronization script.
pub fn squash_suite(ctx: &RunContext) -> Result<Vec<Scenario>> {
    let base = Topology {
        community_commits: 4,
        enterprise_patches: 5,
    };

    Ok(vec![
        // Dry runs must not move anything.
        Scenario::new("squash-dry-run", squash_op(ctx, true)?)
            .topology(base)
            .expect(Predicate::ExitCode { code: 0 })
            .expect(Predicate::SnapshotUnchanged),
        // Five patches collapse into one commit and leave a squash tag.
        Scenario::new("squash-patches", squash_op(ctx, false)?)
            .topology(base)
            .expect(Predicate::ExitCode { code: 0 })
            .expect(Predicate::CommitCountDelta { delta: -4 })
            .expect(Predicate::HeadChanged)
            .expect(Predicate::TagAdded {
                pattern: "^squash-".to_string(),
            })
            .expect(Predicate::NoTagsRemoved)
            .expect(Predicate::CleanWorktree),
        Scenario::new("squash-no-patches", squash_op(ctx, false)?)
            .topology(Topology {
                community_commits: 4,
                enterprise_patches: 0,
            })
            .expect(Predicate::ExitCode { code: 0 })
            .expect(Predicate::SnapshotUnchanged),
        // A single patch has nothing to squash with.
        Scenario::new("squash-single-patch", squash_op(ctx, false)?)
            .topology(Topology {
                community_commits: 4,
                enterprise_patches: 1,
            })
            .expect(Predicate::ExitCode { code: 0 })
            .expect(Predicate::SnapshotUnchanged),
    ])
}

/// The full built-in suite, rebase scenarios first.
pub fn all(ctx: &RunContext) -> Result<Vec<Scenario>> {
    let mut scenarios = rebase_suite(ctx)?;
    scenarios.extend(squash_suite(ctx)?);
    Ok(scenarios)
}

/// Names of all built-in scenarios, for listing without a scripts
/// directory configured.
pub fn scenario_names() -> Vec<&'static str> {
    vec![
        "rebase-single-commit",
        "rebase-batch",
        "rebase-no-op",
        "rebase-conflict",
        "squash-dry-run",
        "squash-patches",
        "squash-no-patches",
        "squash-single-patch",
    ]
}
