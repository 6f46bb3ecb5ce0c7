//! Reqsift CLI - Pull requirement sections out of specification documents.

use anyhow::Context;
use clap::Parser;
use reqsift_cli::commands;
use reqsift_cli::cli::ConfigAction;
use reqsift_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Log to stderr so stdout stays machine-readable
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    // `config init` must work before any file exists
    let initializing = matches!(&cli.command, Command::Config(args) if matches!(args.action, ConfigAction::Init { .. }));
    let config = if initializing {
        Config::default()
    } else {
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &config, &formatter).await?,
        Command::Named(args) => commands::execute_named(args, &config, &formatter).await?,
        Command::Catalog(args) => commands::execute_catalog(args, &config, &formatter).await?,
        Command::Rematch(args) => commands::execute_rematch(args, &config, &formatter).await?,
        Command::Locate(args) => commands::execute_locate(args, &config, &formatter)?,
        Command::Toc(args) => commands::execute_toc(args, &formatter)?,
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter)?
        }
    }

    Ok(())
}
