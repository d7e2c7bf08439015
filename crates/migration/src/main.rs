use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./henhouse.db?mode=rwc";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "up".to_string());
    let steps = args.next().map(|value| value.parse::<u32>()).transpose()?;

    let db_url = std::env::var("HENHOUSE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    let db = Database::connect(&db_url).await?;

    match cmd.as_str() {
        "up" => Migrator::up(&db, steps).await?,
        // Roll back one step unless told otherwise.
        "down" => Migrator::down(&db, steps.or(Some(1))).await?,
        "fresh" => Migrator::fresh(&db).await?,
        "status" => Migrator::status(&db).await?,
        _ => {
            eprintln!("Usage: cargo run -p migration -- [up [N]|down [N]|fresh|status]");
            std::process::exit(2);
        }
    }

    Ok(())
}
