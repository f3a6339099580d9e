use anyhow::Context;
use clap::{Parser, Subcommand};
use migrations::{Migrator, MigratorTrait};
use tracing::info;

use giftshop_api::db::{establish_connection_with_config, DbConfig};

const DEFAULT_DATABASE_URL: &str = "sqlite://giftshop.db?mode=rwc";

/// Applies or inspects the gift shop schema.
#[derive(Debug, Parser)]
#[command(name = "migration", version, about = "Gift shop database migrations")]
struct Cli {
    /// Connection string; falls back to DATABASE_URL, then APP__DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up {
        /// Apply at most this many migrations
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        /// Roll back this many migrations
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Show which migrations have been applied
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

fn resolve_database_url(cli: &Cli) -> String {
    cli.database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .or_else(|| std::env::var("APP__DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let url = resolve_database_url(&cli);
    info!("Connecting to database: {}", url);

    let db = establish_connection_with_config(&DbConfig {
        url,
        max_connections: 2,
        min_connections: 1,
        ..DbConfig::default()
    })
    .await
    .context("failed to connect to the database")?;

    match cli.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => {
            Migrator::up(&db, steps).await?;
            info!("Migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&db, Some(steps)).await?;
            info!("Rolled back {} migration(s)", steps);
        }
        Command::Status => Migrator::status(&db).await?,
        Command::Fresh => {
            Migrator::fresh(&db).await?;
            info!("Schema recreated");
        }
    }

    Ok(())
}
