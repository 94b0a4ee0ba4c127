//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET /health                 - Liveness check
//! GET /health/ready           - Readiness check (pings the database)
//!
//! # Orders
//! GET /orders/{id}            - Shipment state of an order
//! GET /orders/{id}/label      - Label document (?create=true books first)
//! ```

pub mod orders;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(orders::show))
        .route("/{id}/label", get(orders::label))
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/orders", order_routes())
}
