//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Validate community-sync scripts against disposable git fixtures
#[derive(Parser, Debug)]
#[command(name = "sync-harness")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a harness.toml configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which built-in suite to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Suite {
    /// Rebase-style synchronization scenarios
    Rebase,
    /// Squash-style synchronization scenarios
    Squash,
    /// Every built-in scenario
    All,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run scenarios and report aggregate pass/fail
    ///
    /// Exits non-zero unless every scenario passed, so the command can
    /// drive an automation pipeline directly.
    Run {
        /// Built-in suite to run
        #[arg(long, value_enum, default_value_t = Suite::All)]
        suite: Suite,

        /// Run scenarios from TOML files instead of a built-in suite
        #[arg(long, conflicts_with = "suite")]
        file: Vec<PathBuf>,

        /// Directory holding the synchronization scripts under test
        #[arg(long)]
        scripts_dir: Option<PathBuf>,

        /// Output the report as JSON for automation
        #[arg(long)]
        json: bool,

        /// Leave fixture directories behind for inspection
        #[arg(long)]
        keep_fixtures: bool,

        /// Abort after the first scenario that does not pass
        #[arg(long)]
        fail_fast: bool,
    },

    /// List the built-in scenarios
    List,

    /// Remove the ephemeral fixture root
    Clean,

    /// Interactive scenario menu
    Menu {
        /// Directory holding the synchronization scripts under test
        #[arg(long)]
        scripts_dir: Option<PathBuf>,
    },
}
