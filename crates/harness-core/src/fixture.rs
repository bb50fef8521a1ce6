//! Disposable git repository fixtures.
//!
//! The builder constructs the four-repository topology the synchronization
//! scripts operate on: a community repository with its bare origin, and an
//! enterprise repository (sharing the community history, carrying local
//! patches on top) with its own bare origin plus a `community` remote.
//! Remote relationships are wired between local paths so a fetch never
//! touches the network.
//!
//! All fixtures for one scenario live under a single subtree of the
//! context root, so removing that subtree tears the scenario down
//! atomically. Cleanup is idempotent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use harness_git::git::git;

use crate::context::RunContext;
use crate::error::{Error, Result};

/// Marker file written at a fixture subtree root. Directories without it
/// are treated as unrelated and never overwritten.
const FIXTURE_MARKER: &str = ".sync-fixture";

/// Initial shape of the repositories under test.
///
/// Commit counts are totals: a repository built with `community_commits: 3`
/// holds exactly three commits (the initial commit plus two deterministic
/// change commits). The enterprise repository holds the full community
/// history plus `enterprise_patches` local patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Topology {
    /// Total commits in the community repository (minimum 1)
    pub community_commits: usize,
    /// Enterprise patches on top of the community history
    pub enterprise_patches: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            community_commits: 4,
            enterprise_patches: 2,
        }
    }
}

/// A named, fully-controlled git repository used as test input.
#[derive(Debug, Clone)]
pub struct RepositoryFixture {
    /// Fixture name ("community" or "enterprise")
    pub name: String,
    /// Working repository path
    pub path: PathBuf,
    /// Linked bare origin repository, if one was wired
    pub origin: Option<PathBuf>,
    /// Linked upstream remote (the community origin), for enterprise fixtures
    pub upstream: Option<PathBuf>,
}

/// The community/enterprise pair produced by one build.
#[derive(Debug)]
pub struct FixturePair {
    pub community: RepositoryFixture,
    pub enterprise: RepositoryFixture,
}

impl FixturePair {
    /// Select a fixture by side.
    pub fn side(&self, side: Side) -> &RepositoryFixture {
        match side {
            Side::Community => &self.community,
            Side::Enterprise => &self.enterprise,
        }
    }
}

/// Which repository of a pair a setup step or operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Community,
    Enterprise,
}

/// Builds and tears down fixture pairs under a [`RunContext`] root.
pub struct FixtureBuilder<'a> {
    ctx: &'a RunContext,
}

impl<'a> FixtureBuilder<'a> {
    /// Create a builder bound to the given context.
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    /// Build the community/enterprise pair for `scenario`.
    ///
    /// A previous build of the same scenario is removed first. A non-empty
    /// target directory that is not a prior build fails with
    /// [`Error::Fixture`] so an unrelated directory is never clobbered.
    pub fn build(&self, scenario: &str, topology: Topology) -> Result<FixturePair> {
        validate_scenario_name(scenario)?;
        if topology.community_commits == 0 {
            return Err(Error::fixture(
                "topology requires at least one community commit",
            ));
        }

        let root = self.ctx.fixture_root(scenario);
        self.prepare_root(&root)?;

        tracing::info!(scenario, ?topology, root = %root.display(), "building fixtures");

        let community = self.build_community(&root, topology.community_commits)?;
        let enterprise = self.build_enterprise(&root, &community, topology.enterprise_patches)?;

        Ok(FixturePair {
            community,
            enterprise,
        })
    }

    /// Append `n` deterministic commits to a fixture and push them.
    ///
    /// Each commit embeds a monotonically increasing counter in its file
    /// name, file content and message, so post-operation validation can
    /// tell old commits from new ones unambiguously. Returns the new
    /// commit identifiers, oldest first.
    pub fn add_commits(&self, fixture: &RepositoryFixture, n: usize) -> Result<Vec<String>> {
        let counted = git(&fixture.path, &["rev-list", "--count", "HEAD"])?;
        let start: usize = counted
            .parse()
            .map_err(|_| Error::fixture(format!("unexpected rev-list count: {counted:?}")))?;

        let mut ids = Vec::with_capacity(n);
        for i in 1..=n {
            let counter = start + i;
            let file = format!("update-{counter:04}.txt");
            let message = format!("feat: {} update {counter:04}", fixture.name);
            let content = format!("{} update {counter:04}\n", fixture.name);
            ids.push(commit_file(&fixture.path, &file, &content, &message)?);
        }

        if fixture.origin.is_some() {
            git(&fixture.path, &["push", "origin", "HEAD"])?;
        }
        tracing::debug!(fixture = %fixture.name, added = n, "appended commits");
        Ok(ids)
    }

    /// Commit one file with explicit content and message, then push.
    ///
    /// Used by scenarios that need hand-crafted commits, e.g. the same
    /// path edited on both sides to provoke a conflict.
    pub fn add_file_commit(
        &self,
        fixture: &RepositoryFixture,
        file: &str,
        content: &str,
        message: &str,
    ) -> Result<String> {
        let id = commit_file(&fixture.path, file, content, message)?;
        if fixture.origin.is_some() {
            git(&fixture.path, &["push", "origin", "HEAD"])?;
        }
        Ok(id)
    }

    /// Remove the fixture subtree for `scenario`. A missing subtree is a
    /// no-op so teardown can be invoked defensively.
    ///
    /// Only subtrees carrying the fixture marker are removed; anything else
    /// under the scenario's path is left alone, matching the guard in
    /// [`FixtureBuilder::build`].
    pub fn cleanup(&self, scenario: &str) -> Result<()> {
        validate_scenario_name(scenario)?;
        let root = self.ctx.fixture_root(scenario);
        if root.exists() && !root.join(FIXTURE_MARKER).exists() {
            tracing::warn!(
                root = %root.display(),
                "skipping teardown: not a harness fixture"
            );
            return Ok(());
        }
        cleanup_path(&root)
    }

    fn prepare_root(&self, root: &Path) -> Result<()> {
        if root.exists() {
            let marked = root.join(FIXTURE_MARKER).exists();
            let empty = root.read_dir()?.next().is_none();
            if !marked && !empty {
                return Err(Error::fixture(format!(
                    "refusing to overwrite {}: non-empty and not a harness fixture",
                    root.display()
                )));
            }
            fs::remove_dir_all(root)?;
        }
        fs::create_dir_all(root)?;
        fs::write(root.join(FIXTURE_MARKER), "community-sync-harness fixture root\n")?;
        Ok(())
    }

    fn build_community(&self, root: &Path, commits: usize) -> Result<RepositoryFixture> {
        let origin = root.join("community-origin");
        let path = root.join("community-repo");

        init_bare(root, &origin)?;
        git(
            root,
            &[
                "clone",
                origin.to_string_lossy().as_ref(),
                path.to_string_lossy().as_ref(),
            ],
        )?;
        configure_identity(&path, "Community Bot", "community@harness.test")?;
        git(&path, &["symbolic-ref", "HEAD", "refs/heads/main"])?;

        // The scripts link added later must never show up as a dirty tree.
        fs::write(path.join("README.md"), "# Community Repo\n")?;
        fs::write(path.join(".gitignore"), "scripts\n")?;
        git(&path, &["add", "."])?;
        git(&path, &["commit", "-m", "Initial commit"])?;

        for i in 1..commits {
            let file = format!("feature-{i:04}.txt");
            let content = format!("community feature {i:04}\n");
            let message = format!("feat: community feature {i:04}");
            commit_file(&path, &file, &content, &message)?;
        }
        git(&path, &["push", "origin", "main"])?;

        Ok(RepositoryFixture {
            name: "community".to_string(),
            path,
            origin: Some(origin),
            upstream: None,
        })
    }

    fn build_enterprise(
        &self,
        root: &Path,
        community: &RepositoryFixture,
        patches: usize,
    ) -> Result<RepositoryFixture> {
        let origin = root.join("enterprise-origin");
        let path = root.join("enterprise-repo");
        let upstream = community
            .origin
            .clone()
            .ok_or_else(|| Error::fixture("community fixture has no origin to clone from"))?;

        init_bare(root, &origin)?;

        // Clone the community history, then repoint origin at the
        // enterprise bare repo and keep community as a named remote.
        git(
            root,
            &[
                "clone",
                upstream.to_string_lossy().as_ref(),
                path.to_string_lossy().as_ref(),
            ],
        )?;
        configure_identity(&path, "Enterprise Bot", "enterprise@harness.test")?;
        git(
            &path,
            &[
                "remote",
                "set-url",
                "origin",
                origin.to_string_lossy().as_ref(),
            ],
        )?;
        git(
            &path,
            &[
                "remote",
                "add",
                "community",
                upstream.to_string_lossy().as_ref(),
            ],
        )?;
        git(&path, &["fetch", "community"])?;

        for i in 1..=patches {
            let file = format!("enterprise-patch-{i:04}.txt");
            let content = format!("enterprise patch {i:04}\n");
            let message = format!("feat: enterprise patch {i:04}");
            commit_file(&path, &file, &content, &message)?;
        }
        git(&path, &["push", "origin", "main"])?;

        self.link_scripts(&path)?;

        Ok(RepositoryFixture {
            name: "enterprise".to_string(),
            path,
            origin: Some(origin),
            upstream: Some(upstream),
        })
    }

    /// Link the external tool's script directory into the enterprise
    /// fixture, the way a real enterprise checkout carries it.
    fn link_scripts(&self, repo: &Path) -> Result<()> {
        let Some(scripts) = self.ctx.scripts_dir() else {
            return Ok(());
        };
        let link = repo.join("scripts");

        #[cfg(unix)]
        std::os::unix::fs::symlink(scripts, &link)?;
        #[cfg(windows)]
        std::os::windows::fs::symlink_dir(scripts, &link)?;

        tracing::debug!(link = %link.display(), target = %scripts.display(), "linked scripts");
        Ok(())
    }
}

/// A scenario name is a single path component; anything else would place
/// the fixture subtree (and its teardown) outside the context root.
fn validate_scenario_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::fixture(format!(
            "invalid scenario name {name:?}: must be a single path component"
        )));
    }
    Ok(())
}

/// Remove a fixture subtree. Idempotent: a missing path is a no-op.
pub fn cleanup_path(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
        tracing::debug!(path = %path.display(), "removed fixture subtree");
    }
    Ok(())
}

/// Create a bare repository whose HEAD names `main`, so clones check out
/// the branch the fixtures push regardless of the host's default branch.
fn init_bare(root: &Path, path: &Path) -> Result<()> {
    git(root, &["init", "--bare", path.to_string_lossy().as_ref()])?;
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    Ok(())
}

fn configure_identity(repo: &Path, name: &str, email: &str) -> Result<()> {
    git(repo, &["config", "user.name", name])?;
    git(repo, &["config", "user.email", email])?;
    git(repo, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

/// Write `file` with `content`, commit it, and return the commit id.
fn commit_file(repo: &Path, file: &str, content: &str, message: &str) -> Result<String> {
    let target = repo.join(file);
    if let Some(parent) = target.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, content)?;
    git(repo, &["add", file])?;
    git(repo, &["commit", "-m", message])?;
    Ok(git(repo, &["rev-parse", "HEAD"])?)
}
