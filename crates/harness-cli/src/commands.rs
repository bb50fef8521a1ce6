//! Command implementations
//!
//! Thin glue between the parsed CLI and harness-core: builds the
//! `RunContext`, selects scenarios, runs the orchestrator and prints the
//! report. No invariant logic lives here.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

use harness_core::{
    Orchestrator, OrchestratorOptions, RunContext, Scenario, cleanup_path, suites,
};

use crate::cli::Suite;
use crate::error::{CliError, Result};

/// Build the run context from an optional configuration file and CLI
/// overrides. Configuration is read once; flags win over the file.
pub fn build_context(config: Option<&Path>, scripts_dir: Option<PathBuf>) -> Result<RunContext> {
    let mut ctx = match config {
        Some(path) => RunContext::load(path)?,
        None => RunContext::new(RunContext::default_root()),
    };
    if let Some(dir) = scripts_dir {
        ctx = ctx.with_scripts_dir(dir);
    }
    Ok(ctx)
}

/// Resolve the scenarios to run: explicit TOML files, or a built-in suite.
pub fn select_scenarios(
    ctx: &RunContext,
    suite: Suite,
    files: &[PathBuf],
) -> Result<Vec<Scenario>> {
    if !files.is_empty() {
        let mut scenarios = Vec::with_capacity(files.len());
        for file in files {
            let text = fs::read_to_string(file)?;
            scenarios.push(Scenario::from_toml(&text)?);
        }
        return Ok(scenarios);
    }

    let scenarios = match suite {
        Suite::Rebase => suites::rebase_suite(ctx)?,
        Suite::Squash => suites::squash_suite(ctx)?,
        Suite::All => suites::all(ctx)?,
    };
    Ok(scenarios)
}

/// Run scenarios and print the report. Returns whether everything passed.
pub fn run_scenarios(
    ctx: &RunContext,
    scenarios: &[Scenario],
    json: bool,
    keep_fixtures: bool,
    fail_fast: bool,
) -> Result<bool> {
    if scenarios.is_empty() {
        return Err(CliError::user("no scenarios to run"));
    }

    tracing::info!(count = scenarios.len(), json, keep_fixtures, fail_fast, "starting run");
    let options = OrchestratorOptions {
        fail_fast,
        keep_fixtures,
    };
    let report = Orchestrator::new(ctx).with_options(options).run_all(scenarios);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
        let summary = format!(
            "{} passed, {} failed, {} errored",
            report.passed, report.failed, report.errored
        );
        if report.all_passed() {
            println!("{} {}", "ok:".green().bold(), summary);
        } else {
            println!("{} {}", "failed:".red().bold(), summary);
        }
    }

    Ok(report.all_passed())
}

/// Print the names of the built-in scenarios.
pub fn run_list() {
    println!("{}", "Built-in scenarios:".bold());
    for name in suites::scenario_names() {
        println!("  {name}");
    }
}

/// Remove the ephemeral fixture root (and every fixture and scripts link
/// under it). Idempotent.
pub fn run_clean(ctx: &RunContext) -> Result<()> {
    cleanup_path(ctx.root()).map_err(CliError::Core)?;
    println!("removed {}", ctx.root().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn context_flags_override_the_configuration_file() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("harness.toml");
        fs::write(&config, "scripts-dir = \"/from/file\"\n").unwrap();

        let ctx = build_context(Some(&config), Some(PathBuf::from("/from/flag"))).unwrap();
        assert_eq!(ctx.scripts_dir(), Some(Path::new("/from/flag")));
    }

    #[test]
    fn scenario_files_take_precedence_over_suites() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("scenario.toml");
        fs::write(
            &file,
            "name = \"from-file\"\n[operation]\nname = \"noop\"\nprogram = \"true\"\n",
        )
        .unwrap();

        let ctx = RunContext::new(temp.path());
        let scenarios = select_scenarios(&ctx, Suite::All, &[file]).unwrap();

        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].name, "from-file");
    }

    #[test]
    fn builtin_suites_require_a_scripts_directory() {
        let temp = TempDir::new().unwrap();
        let ctx = RunContext::new(temp.path());

        let err = select_scenarios(&ctx, Suite::Rebase, &[]).unwrap_err();
        assert!(err.to_string().contains("scripts directory"));
    }

    #[test]
    fn clean_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("fixtures");
        fs::create_dir_all(&root).unwrap();
        let ctx = RunContext::new(&root);

        run_clean(&ctx).unwrap();
        assert!(!root.exists());
        run_clean(&ctx).unwrap();
    }
}
