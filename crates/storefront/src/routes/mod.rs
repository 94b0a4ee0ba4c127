//! HTTP route handlers for the storefront.
//!
//! All surfaces are JSON; page rendering lives outside this repository.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (pings the database)
//!
//! # Cart
//! GET    /cart                    - Resolved cart view (read-only)
//! POST   /cart/items              - Add to cart (mints a guest token if needed)
//! PATCH  /cart/items/{id}         - Set line quantity (0 removes)
//! DELETE /cart/items/{id}         - Remove line
//!
//! # Checkout
//! GET    /checkout                - Aggregated summary (400 cart_empty when empty)
//! POST   /checkout/confirm        - Order placement (called after payment confirmation)
//!
//! # Shipping
//! GET    /shipping/methods        - Candidate methods for ?country=XX
//!
//! # Session boundary
//! POST   /auth/session            - Login notification from the identity provider;
//!                                   triggers the one-time guest cart merge
//!
//! # Account (requires a logged-in user id in the session)
//! GET    /account/addresses       - Address book
//! POST   /account/addresses       - Create address
//! POST   /account/addresses/{id}/default-shipping - Make default shipping
//! POST   /account/addresses/{id}/default-billing  - Make default billing
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod shipping;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route(
            "/items/{id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/confirm", post(checkout::confirm))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/addresses",
            get(addresses::list).post(addresses::create),
        )
        .route(
            "/addresses/{id}/default-shipping",
            post(addresses::make_default_shipping),
        )
        .route(
            "/addresses/{id}/default-billing",
            post(addresses::make_default_billing),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/shipping/methods", get(shipping::methods))
        .route("/auth/session", post(auth::session_started))
        .nest("/account", account_routes())
}
