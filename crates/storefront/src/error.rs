//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; responses carry a machine-readable kind alongside
//! the HTTP status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::merge::MergeError;
use crate::services::orders::OrderError;
use crate::services::shipping::ShippingError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout aggregation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Shipping rate resolution failed.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),

    /// Cart merge failed.
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Order placement failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body with a machine-readable kind.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => store_status(err),
            Self::Cart(err) => match err {
                CartError::InvalidQuantity(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CartError::MissingIdentity => StatusCode::BAD_REQUEST,
                CartError::UnknownProduct { .. }
                | CartError::NoCart
                | CartError::UnknownItem(_) => StatusCode::NOT_FOUND,
                CartError::Store(err) => store_status(err),
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
                CheckoutError::UnknownProduct { .. } => StatusCode::NOT_FOUND,
                CheckoutError::Store(err) => store_status(err),
            },
            Self::Shipping(err) => match err {
                ShippingError::InvalidCountry(_) => StatusCode::BAD_REQUEST,
                ShippingError::Store(err) => store_status(err),
            },
            Self::Merge(err) => match err {
                MergeError::Contention => StatusCode::CONFLICT,
                MergeError::Store(err) => store_status(err),
            },
            Self::Order(err) => match err {
                OrderError::MissingPickupPoint => StatusCode::BAD_REQUEST,
                OrderError::NumberContention => StatusCode::CONFLICT,
                OrderError::Store(err) => store_status(err),
            },
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable kind for clients deciding whether to retry.
    const fn kind(&self) -> &'static str {
        match self {
            Self::Checkout(CheckoutError::EmptyCart) => "cart_empty",
            Self::Order(OrderError::MissingPickupPoint) => "missing_pickup_point",
            Self::Merge(MergeError::Contention) | Self::Order(OrderError::NumberContention) => {
                "conflict"
            }
            Self::Shipping(ShippingError::InvalidCountry(_))
            | Self::Cart(CartError::InvalidQuantity(_) | CartError::MissingIdentity)
            | Self::BadRequest(_) => "validation",
            Self::NotFound(_)
            | Self::Store(StoreError::NotFound)
            | Self::Cart(
                CartError::UnknownProduct { .. } | CartError::NoCart | CartError::UnknownItem(_),
            )
            | Self::Checkout(CheckoutError::UnknownProduct { .. }) => "not_found",
            Self::Store(StoreError::Conflict(_)) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            _ => "internal",
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Database(_) | StoreError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: self.kind(),
                message,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use marram_core::CountryCodeError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_validation_errors_are_400_family() {
        assert_eq!(
            status_of(AppError::Cart(CartError::InvalidQuantity(0))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::Shipping(ShippingError::InvalidCountry(
                CountryCodeError::WrongLength("FRA".to_owned())
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Order(OrderError::MissingPickupPoint)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_transient_conflicts_are_409() {
        assert_eq!(
            status_of(AppError::Merge(MergeError::Contention)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Order(OrderError::NumberContention)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_not_found_mapping() {
        assert_eq!(
            status_of(AppError::NotFound("order".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_kinds_are_machine_readable() {
        assert_eq!(AppError::Checkout(CheckoutError::EmptyCart).kind(), "cart_empty");
        assert_eq!(
            AppError::Order(OrderError::MissingPickupPoint).kind(),
            "missing_pickup_point"
        );
        assert_eq!(AppError::Merge(MergeError::Contention).kind(), "conflict");
        assert_eq!(
            AppError::BadRequest("country".to_owned()).kind(),
            "validation"
        );
    }
}
