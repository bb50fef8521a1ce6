//! Run-wide configuration reified as an explicit context value.
//!
//! Instead of reading ambient globals, every component takes a
//! [`RunContext`]: the ephemeral fixture root, the location of the
//! synchronization scripts under test, and the default bounds for
//! operations and snapshots. Contexts are built once at orchestration
//! start and never reconfigured at runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Default bound on a single external operation.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default recent-commit window captured per snapshot.
const DEFAULT_SNAPSHOT_WINDOW: usize = 50;

/// On-disk configuration surface (`harness.toml`). All fields optional;
/// anything unset falls back to the built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ContextFile {
    /// Root directory for ephemeral fixtures
    root: Option<PathBuf>,
    /// Directory holding the synchronization scripts under test
    scripts_dir: Option<PathBuf>,
    /// Per-operation timeout in seconds
    timeout_secs: Option<u64>,
    /// Snapshot recent-commit window
    snapshot_window: Option<usize>,
}

/// Shared state for one harness run.
#[derive(Debug)]
pub struct RunContext {
    root: PathBuf,
    scripts_dir: Option<PathBuf>,
    timeout: Duration,
    snapshot_window: usize,
    // Keeps an ephemeral root alive for the lifetime of the context.
    _ephemeral: Option<tempfile::TempDir>,
}

impl RunContext {
    /// Create a context rooted at a fixed directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scripts_dir: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            snapshot_window: DEFAULT_SNAPSHOT_WINDOW,
            _ephemeral: None,
        }
    }

    /// Create a context whose root is a temporary directory removed when
    /// the context is dropped.
    pub fn ephemeral() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("community-sync-harness-")
            .tempdir()?;
        let mut ctx = Self::new(dir.path().to_path_buf());
        ctx._ephemeral = Some(dir);
        Ok(ctx)
    }

    /// Load a context from a `harness.toml` configuration file.
    ///
    /// The configuration is read exactly once; there is no runtime
    /// reconfiguration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ContextFile = toml::from_str(&content)?;

        let mut ctx = Self::new(file.root.unwrap_or_else(Self::default_root));
        ctx.scripts_dir = file.scripts_dir;
        if let Some(secs) = file.timeout_secs {
            ctx.timeout = Duration::from_secs(secs);
        }
        if let Some(window) = file.snapshot_window {
            ctx.snapshot_window = window;
        }
        tracing::debug!(?ctx, "loaded run context");
        Ok(ctx)
    }

    /// The well-known fixture root used when none is configured.
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join("community-sync-harness")
    }

    /// Set the directory holding the synchronization scripts under test.
    pub fn with_scripts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scripts_dir = Some(dir.into());
        self
    }

    /// Set the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the snapshot recent-commit window.
    pub fn with_snapshot_window(mut self, window: usize) -> Self {
        self.snapshot_window = window;
        self
    }

    /// Root directory under which all fixtures live.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the external scripts, if configured.
    pub fn scripts_dir(&self) -> Option<&Path> {
        self.scripts_dir.as_deref()
    }

    /// Default bound for a single external operation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Recent-commit window captured per snapshot.
    pub fn snapshot_window(&self) -> usize {
        self.snapshot_window
    }

    /// Fixture subtree for one scenario. Distinct scenarios get distinct
    /// subtrees so their mutations can never interleave.
    pub fn fixture_root(&self, scenario: &str) -> PathBuf {
        self.root.join(scenario)
    }
}
