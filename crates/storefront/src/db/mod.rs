//! Database operations for the storefront `PostgreSQL`.
//!
//! # Database: `marram`
//!
//! One database shared with the admin binary (orders written here are read
//! by the back office):
//!
//! ## Tables
//!
//! - `storefront.product` / `storefront.product_variant` - catalog snapshots
//! - `storefront.cart` / `storefront.cart_item` - shopper carts
//! - `storefront.shipping_zone` / `storefront.shipping_zone_country` /
//!   `storefront.shipping_method` / `storefront.shipping_method_tier` /
//!   `storefront.shipping_carrier` - rate configuration
//! - `storefront.orders` / `storefront.order_item` - finalized orders
//! - `storefront.address` - user address book
//! - `tower_sessions.session` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p marram-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod addresses;
pub mod carts;
pub mod catalog;
pub mod orders;
pub mod shipping;

pub use addresses::PgAddressStore;
pub use carts::PgCartStore;
pub use catalog::PgCatalogStore;
pub use orders::PgOrderStore;
pub use shipping::{CachedZoneCatalog, PgShippingStore};

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness or serialization conflict; the operation may be retried.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data violates a domain invariant.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl StoreError {
    /// Map a sqlx error, turning unique violations into [`StoreError::Conflict`].
    #[must_use]
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if is_serialization_code(db_err.code().as_deref()) {
                return Self::Conflict(format!("{what}: serialization failure"));
            }
        }
        Self::Database(err)
    }
}

/// SQLSTATE codes that mean "retry the transaction".
fn is_serialization_code(code: Option<&str>) -> bool {
    // 40001 serialization_failure, 40P01 deadlock_detected
    matches!(code, Some("40001" | "40P01"))
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
