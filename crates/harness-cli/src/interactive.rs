//! Interactive menu mode
//!
//! A thin dialoguer loop over the same commands the non-interactive CLI
//! exposes. Presentation only; all behavior lives in harness-core.

use std::path::PathBuf;

use colored::Colorize;
use dialoguer::{Input, Select, theme::ColorfulTheme};

use harness_core::RunContext;

use crate::cli::Suite;
use crate::commands;
use crate::error::Result;

const MENU_ITEMS: &[&str] = &[
    "Run rebase suite",
    "Run squash suite",
    "Run all scenarios",
    "List built-in scenarios",
    "Clean fixture root",
    "Quit",
];

/// Run the interactive menu loop until the user quits.
pub fn run_menu(config: Option<&std::path::Path>, scripts_dir: Option<PathBuf>) -> Result<()> {
    let mut ctx = commands::build_context(config, scripts_dir)?;
    println!("{}", "community-sync harness".bold());

    loop {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select an action")
            .items(MENU_ITEMS)
            .default(0)
            .interact()?;

        match selection {
            0 => ctx = run_suite(ctx, Suite::Rebase)?,
            1 => ctx = run_suite(ctx, Suite::Squash)?,
            2 => ctx = run_suite(ctx, Suite::All)?,
            3 => commands::run_list(),
            4 => commands::run_clean(&ctx)?,
            _ => break,
        }
        println!();
    }

    Ok(())
}

/// Run one suite, prompting for the scripts directory the first time.
fn run_suite(ctx: RunContext, suite: Suite) -> Result<RunContext> {
    let ctx = ensure_scripts_dir(ctx)?;
    let scenarios = commands::select_scenarios(&ctx, suite, &[])?;
    commands::run_scenarios(&ctx, &scenarios, false, false, false)?;
    Ok(ctx)
}

fn ensure_scripts_dir(ctx: RunContext) -> Result<RunContext> {
    if ctx.scripts_dir().is_some() {
        return Ok(ctx);
    }
    let dir: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Scripts directory")
        .interact_text()?;
    Ok(ctx.with_scripts_dir(PathBuf::from(dir)))
}
