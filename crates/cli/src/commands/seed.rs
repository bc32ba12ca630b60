//! Database seeding command.

use soko_storefront::config::database_url_from_env;
use soko_storefront::db;
use tracing::info;

/// Ensure the default admin account and initial catalog exist.
///
/// Migrations are applied first so the command works on a fresh database.
/// Seeding is idempotent: rerunning changes nothing.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or seeding fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = database_url_from_env();

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    db::run_migrations(&pool).await?;
    db::seed::run(&pool).await?;

    info!("Seeding complete!");
    Ok(())
}
