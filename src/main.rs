//! # Beacon Main Entry Point
//!
//! Runs the HTTP service or applies database migrations.

use anyhow::Context;
use beacon::{
    config::ConfigLoader,
    db::init_pool,
    migration::{Migrator, MigratorTrait},
    server::run_server,
    telemetry::init_tracing,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "beacon",
    about = "Anonymous wellbeing surveys and psychosocial risk dashboards",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve,
    /// Manage the database schema
    Migrate {
        #[command(subcommand)]
        command: Option<MigrateCommand>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum MigrateCommand {
    /// Apply all pending migrations (default)
    Up,
    /// Roll back the most recent migration
    Down,
    /// Print applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("failed to load configuration")?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if config.is_development() {
                Migrator::up(&db, None).await?;
                tracing::info!("Applied pending migrations");
            }
            run_server(config, db).await
        }
        Command::Migrate { command } => {
            match command.unwrap_or(MigrateCommand::Up) {
                MigrateCommand::Up => Migrator::up(&db, None).await?,
                MigrateCommand::Down => Migrator::down(&db, Some(1)).await?,
                MigrateCommand::Status => Migrator::status(&db).await?,
            }
            tracing::info!(?command, "Migration command finished");
            Ok(())
        }
    }
}
