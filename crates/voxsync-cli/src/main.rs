//! voxsync CLI - pull transcribed voice uploads into a markdown vault

mod cli;
mod commands;
mod error;
mod presenter;
mod settings;


use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::sync::run_sync;
use crate::commands::watch::run_watch;
use crate::error::CliError;
use crate::settings::resolve_settings_path;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "voxsync=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let settings_path = resolve_settings_path(cli.config)?;
    match cli.command {
        Commands::Auth { command } => run_auth(command, &settings_path).await?,
        Commands::Sync => run_sync(&settings_path).await?,
        Commands::Watch => run_watch(&settings_path).await?,
        Commands::Config { command } => run_config(command, &settings_path)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
