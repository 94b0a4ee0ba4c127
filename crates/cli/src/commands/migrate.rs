//! Database migration command.

use sqlx::postgres::PgPoolOptions;

/// Run the storefront migrations against `STOREFRONT_DATABASE_URL`.
///
/// The admin binary reads the same database, so there is a single migration
/// set.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .map_err(|_| "STOREFRONT_DATABASE_URL is not set")?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    tracing::info!("Running migrations");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;
    tracing::info!("Migrations complete");

    Ok(())
}
