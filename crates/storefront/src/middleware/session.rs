//! Session middleware configuration and identity extraction.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session
//! only stores the two opaque identity values the checkout core consumes;
//! reading them never creates a session row or a guest token.

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use marram_core::{GuestToken, UserId};

use crate::config::StorefrontConfig;
use crate::models::session::{CartIdentity, keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "marram_session";

/// Session expiry time in seconds (30 days; guests keep their carts).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool
/// * `config` - Storefront configuration (for the secure-cookie flag)
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    // Create the PostgreSQL session store
    // Note: The sessions table must be created via migration
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Read the request's cart identity from the session.
///
/// Read-only: visiting a page never mints a token or creates a cart.
///
/// # Errors
///
/// Returns the session store error if the session backend fails.
pub async fn identity_from(session: &Session) -> Result<CartIdentity, tower_sessions::session::Error> {
    let user = session.get::<UserId>(keys::CURRENT_USER).await?;
    let guest = session.get::<GuestToken>(keys::GUEST_TOKEN).await?;
    Ok(CartIdentity { user, guest })
}
