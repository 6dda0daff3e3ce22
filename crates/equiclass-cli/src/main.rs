//! Equiclass CLI
//!
//! Identify golf balls from photographs.

use anyhow::Result;
use clap::Parser;
use equiclass_core::error::exit_codes;
use equiclass_core::{Config, Database, EquiclassError};
use std::sync::Arc;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    // stdout carries JSON output and the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<EquiclassError>()
            .map(EquiclassError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let db = Database::open(&config.database.path)?;
    db.initialize()?;
    let db = Arc::new(db);

    match cli.command {
        Commands::Classify(args) => commands::classify::run(args, &config, db, cli.format).await,
        Commands::Index(args) => commands::index::run(args, &config, db).await,
        Commands::Catalog(args) => commands::catalog::run(args, &db, cli.format).await,
        Commands::History(args) => commands::history::run(args, &db, cli.format).await,
        Commands::Config(args) => commands::config::run(args, &config, cli.config.as_deref()).await,
        Commands::Mcp => commands::mcp::run(&config, db).await,
    }
}
