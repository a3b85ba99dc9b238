//! ConfigHub CLI
//!
//! Resolves entitlement-driven remote configuration, inspects and resets the
//! last-known-good cache, and lints remote-config templates.

mod cli;
mod commands;
mod error;
mod logging;
mod template;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::Settings;
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to initialize logging: {}", "warning".yellow(), e);
    }
    tracing::debug!(command = ?cli.command, "Starting confighub");

    match cli.command {
        Commands::Resolve {
            template,
            contexts,
            json,
        } => {
            let settings = Settings::load(cli.config.as_deref(), cli.cache)?;
            commands::run_resolve(&settings, &template, &contexts, json).await
        }
        Commands::Show { json } => {
            let settings = Settings::load(cli.config.as_deref(), cli.cache)?;
            commands::run_show(&settings, json)
        }
        Commands::Reset => {
            let settings = Settings::load(cli.config.as_deref(), cli.cache)?;
            commands::run_reset(&settings)
        }
        Commands::Lint {
            template,
            bump,
            write,
            max_bytes,
        } => commands::run_lint(&template, bump, write, max_bytes),
    }
}
