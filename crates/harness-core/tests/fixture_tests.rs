//! Tests for fixture construction and teardown

use std::fs;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use harness_core::{Error, FixtureBuilder, RunContext, Topology};
use harness_git::{CaptureOptions, capture};
use predicates::prelude::*;
use pretty_assertions::assert_eq;

fn topology(community: usize, patches: usize) -> Topology {
    Topology {
        community_commits: community,
        enterprise_patches: patches,
    }
}

#[test]
fn build_produces_the_declared_commit_counts() {
    let ctx = RunContext::ephemeral().unwrap();
    let builder = FixtureBuilder::new(&ctx);

    let pair = builder.build("counts", topology(3, 2)).unwrap();

    let community = capture(&pair.community.path, CaptureOptions::default()).unwrap();
    let enterprise = capture(&pair.enterprise.path, CaptureOptions::default()).unwrap();

    assert_eq!(community.commit_count, 3);
    assert_eq!(enterprise.commit_count, 5, "community history plus patches");
    assert_eq!(community.branch.as_deref(), Some("main"));
    assert_eq!(enterprise.branch.as_deref(), Some("main"));
    assert!(community.clean);
    assert!(enterprise.clean);
    assert!(enterprise.tags.is_empty());
}

#[test]
fn enterprise_shares_the_community_history() {
    let ctx = RunContext::ephemeral().unwrap();
    let builder = FixtureBuilder::new(&ctx);

    let pair = builder.build("shared-history", topology(3, 2)).unwrap();

    let community = capture(&pair.community.path, CaptureOptions::default()).unwrap();
    let enterprise = capture(&pair.enterprise.path, CaptureOptions::default()).unwrap();

    // The community tip must be an ancestor inside the enterprise window.
    let community_head = community.head.unwrap();
    assert!(
        enterprise.commits.iter().any(|c| c.id == community_head),
        "community HEAD missing from enterprise history"
    );
    assert!(pair.enterprise.upstream.is_some());
}

#[test]
fn add_commits_appends_exactly_n_new_identifiers() {
    let ctx = RunContext::ephemeral().unwrap();
    let builder = FixtureBuilder::new(&ctx);
    let pair = builder.build("append", topology(2, 0)).unwrap();

    let before = capture(&pair.community.path, CaptureOptions::default()).unwrap();
    let new_ids = builder.add_commits(&pair.community, 3).unwrap();
    let after = capture(&pair.community.path, CaptureOptions::default()).unwrap();

    assert_eq!(new_ids.len(), 3);
    assert_eq!(after.commit_count, before.commit_count + 3);
    for id in &new_ids {
        assert!(
            !before.commits.iter().any(|c| &c.id == id),
            "new commit {id} already present before the call"
        );
        assert!(after.commits.iter().any(|c| &c.id == id));
    }
}

#[test]
fn add_commits_messages_are_ordering_stable() {
    let ctx = RunContext::ephemeral().unwrap();
    let builder = FixtureBuilder::new(&ctx);
    let pair = builder.build("ordering", topology(1, 0)).unwrap();

    builder.add_commits(&pair.community, 2).unwrap();
    let snap = capture(&pair.community.path, CaptureOptions::default()).unwrap();

    // Counters continue from the existing history: 1 commit -> 0002, 0003.
    assert_eq!(snap.commits[0].subject, "feat: community update 0003");
    assert_eq!(snap.commits[1].subject, "feat: community update 0002");
}

#[test]
fn build_refuses_an_unrelated_directory() {
    let temp = TempDir::new().unwrap();
    let ctx = RunContext::new(temp.path());
    let builder = FixtureBuilder::new(&ctx);

    // An existing non-empty directory without the fixture marker.
    let dirty = ctx.fixture_root("dirty");
    fs::create_dir_all(&dirty).unwrap();
    fs::write(dirty.join("precious.txt"), "do not delete\n").unwrap();

    let err = builder.build("dirty", topology(1, 0)).unwrap_err();

    assert!(matches!(err, Error::Fixture { .. }), "got: {err}");
    temp.child("dirty/precious.txt")
        .assert(predicate::path::exists());
}

#[test]
fn build_replaces_a_prior_build_of_the_same_scenario() {
    let ctx = RunContext::ephemeral().unwrap();
    let builder = FixtureBuilder::new(&ctx);

    builder.build("rebuild", topology(1, 0)).unwrap();
    let pair = builder.build("rebuild", topology(3, 0)).unwrap();

    let snap = capture(&pair.community.path, CaptureOptions::default()).unwrap();
    assert_eq!(snap.commit_count, 3, "second build starts fresh");
}

#[test]
fn build_rejects_an_empty_topology() {
    let ctx = RunContext::ephemeral().unwrap();
    let builder = FixtureBuilder::new(&ctx);

    let err = builder.build("zero", topology(0, 0)).unwrap_err();
    assert!(matches!(err, Error::Fixture { .. }));
}

#[test]
fn cleanup_skips_directories_without_the_marker() {
    let temp = TempDir::new().unwrap();
    let ctx = RunContext::new(temp.path());
    let builder = FixtureBuilder::new(&ctx);

    let foreign = ctx.fixture_root("foreign");
    fs::create_dir_all(&foreign).unwrap();
    fs::write(foreign.join("precious.txt"), "keep\n").unwrap();

    builder.cleanup("foreign").unwrap();

    temp.child("foreign/precious.txt")
        .assert(predicate::path::exists());
}

#[test]
fn scenario_names_cannot_escape_the_fixture_root() {
    let ctx = RunContext::ephemeral().unwrap();
    let builder = FixtureBuilder::new(&ctx);

    for name in ["../escape", "a/b", "a\\b", "..", ".", ""] {
        assert!(
            matches!(builder.build(name, topology(1, 0)), Err(Error::Fixture { .. })),
            "name {name:?} was accepted by build"
        );
        assert!(
            matches!(builder.cleanup(name), Err(Error::Fixture { .. })),
            "name {name:?} was accepted by cleanup"
        );
    }
}

#[test]
fn cleanup_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let ctx = RunContext::new(temp.path());
    let builder = FixtureBuilder::new(&ctx);

    builder.build("teardown", topology(1, 0)).unwrap();
    builder.cleanup("teardown").unwrap();
    temp.child("teardown").assert(predicate::path::missing());

    // Removing an already-removed subtree is a no-op.
    builder.cleanup("teardown").unwrap();
}

#[cfg(unix)]
#[test]
fn scripts_directory_is_linked_into_the_enterprise_repo() {
    let scripts = TempDir::new().unwrap();
    fs::write(scripts.path().join("rebase-community-batch.sh"), "#!/bin/sh\n").unwrap();

    let ctx = RunContext::ephemeral()
        .unwrap()
        .with_scripts_dir(scripts.path());
    let builder = FixtureBuilder::new(&ctx);

    let pair = builder.build("linked", topology(2, 1)).unwrap();

    let link = pair.enterprise.path.join("scripts");
    assert!(link.join("rebase-community-batch.sh").exists());

    // The link is git-ignored, so the tree stays clean.
    let snap = capture(&pair.enterprise.path, CaptureOptions::default()).unwrap();
    assert!(snap.clean);
}
