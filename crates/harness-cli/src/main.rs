//! sync-harness: validate community-sync scripts against git fixtures

mod cli;
mod commands;
mod error;
mod interactive;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
    }

    match run(cli) {
        Ok(all_passed) => {
            if !all_passed {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = cli.config.as_deref();

    match cli.command {
        Some(Commands::Run {
            suite,
            file,
            scripts_dir,
            json,
            keep_fixtures,
            fail_fast,
        }) => {
            let ctx = commands::build_context(config, scripts_dir)?;
            let scenarios = commands::select_scenarios(&ctx, suite, &file)?;
            commands::run_scenarios(&ctx, &scenarios, json, keep_fixtures, fail_fast)
        }
        Some(Commands::List) => {
            commands::run_list();
            Ok(true)
        }
        Some(Commands::Clean) => {
            let ctx = commands::build_context(config, None)?;
            commands::run_clean(&ctx)?;
            Ok(true)
        }
        Some(Commands::Menu { scripts_dir }) => {
            interactive::run_menu(config, scripts_dir)?;
            Ok(true)
        }
        None => {
            interactive::run_menu(config, None)?;
            Ok(true)
        }
    }
}
