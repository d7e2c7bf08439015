use std::time::Duration;

use chrono::Local;
use clap::Parser;
use migration::{Migrator, MigratorTrait};
use settings::Database;

use commands::Context;

mod cli;
mod commands;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "henhouse={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    let quiet = Duration::from_millis(settings.autosave.quiet_ms);

    match cli.timezone.or(settings.app.timezone) {
        Some(name) => {
            let tz: chrono_tz::Tz = name
                .parse()
                .map_err(|err| format!("invalid time zone {name}: {err}"))?;
            tracing::debug!("using time zone {tz}");
            commands::run(&Context { engine, tz, quiet }, cli.command).await
        }
        None => {
            let ctx = Context {
                engine,
                tz: Local,
                quiet,
            };
            commands::run(&ctx, cli.command).await
        }
    }
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
