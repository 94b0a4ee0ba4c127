//! Unified error handling with Sentry integration.
//!
//! Mirrors the storefront's `AppError`: route handlers return
//! `Result<T, AppError>`, server errors are captured to Sentry, and
//! responses carry a machine-readable kind.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::carrier::CarrierError;
use crate::db::StoreError;
use crate::services::labels::LabelError;

/// Application-level error type for the admin.
#[derive(Debug, Error)]
pub enum AppError {
    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Label request failed.
    #[error("Label error: {0}")]
    Label(#[from] LabelError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

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
            Self::Label(err) => match err {
                LabelError::UnknownOrder(_) => StatusCode::NOT_FOUND,
                LabelError::MissingPickupPoint | LabelError::NoShipmentYet => {
                    StatusCode::BAD_REQUEST
                }
                LabelError::Carrier(_) => StatusCode::BAD_GATEWAY,
                LabelError::Store(err) => store_status(err),
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Label(err) => match err {
                LabelError::UnknownOrder(_) => "not_found",
                LabelError::MissingPickupPoint => "missing_pickup_point",
                LabelError::NoShipmentYet => "no_shipment_yet",
                LabelError::Carrier(CarrierError::Rejected { .. }) => "carrier_rejected",
                LabelError::Carrier(_) => "carrier_unreachable",
                LabelError::Store(_) => "internal",
            },
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "validation",
            Self::Store(_) => "internal",
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Database(_) | StoreError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors (including carrier failures) to Sentry
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
    use marram_core::OrderId;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_label_preconditions_are_400() {
        assert_eq!(
            status_of(AppError::Label(LabelError::MissingPickupPoint)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Label(LabelError::NoShipmentYet)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_unknown_order_is_404() {
        assert_eq!(
            status_of(AppError::Label(LabelError::UnknownOrder(OrderId::new(9)))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_carrier_failures_are_502() {
        let rejected = AppError::Label(LabelError::Carrier(CarrierError::Rejected {
            status: 422,
            message: "bad pickup point".to_owned(),
        }));
        assert_eq!(rejected.kind(), "carrier_rejected");
        assert_eq!(status_of(rejected), StatusCode::BAD_GATEWAY);
    }
}
