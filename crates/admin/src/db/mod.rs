//! Database operations for the back office.
//!
//! The admin binary reads the same `marram` database the storefront writes:
//! orders created at checkout are picked up here for shipment booking. Only
//! the status and shipment fields are ever updated.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod orders;

pub use orders::PgShipmentStore;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// Stored data violates a domain invariant.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
