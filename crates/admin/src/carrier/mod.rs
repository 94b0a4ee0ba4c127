//! Carrier shipping API client.
//!
//! Books shipments and fetches label documents from the external carrier.
//! The carrier's failure modes are kept distinct: a transport problem
//! (network, timeout) is not the same as the carrier rejecting the request,
//! and neither is retried here - retry policy belongs to the caller.

pub mod client;
pub mod types;

pub use client::CarrierClient;
pub use types::{CreateShipmentRequest, LabelDocument, ShipmentNumber, StoreAddress};

use thiserror::Error;

/// Errors that can occur when talking to the carrier API.
#[derive(Debug, Error)]
pub enum CarrierError {
    /// The request never completed: network failure or timeout.
    #[error("carrier unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The carrier processed the request and said no.
    #[error("carrier rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status the carrier returned.
        status: u16,
        /// The carrier's message, passed through opaquely.
        message: String,
    },

    /// The carrier's response did not have the expected shape.
    #[error("carrier response unreadable: {0}")]
    Parse(String),
}

/// Operations this service needs from a carrier.
///
/// Implemented by [`CarrierClient`] for the real API and by fakes in tests.
#[allow(async_fn_in_trait)]
pub trait CarrierApi {
    /// Book a shipment; returns the carrier's shipment number.
    async fn create_shipment(
        &self,
        request: &CreateShipmentRequest<'_>,
    ) -> Result<ShipmentNumber, CarrierError>;

    /// Fetch the label document for a booked shipment.
    async fn fetch_label(&self, shipment: &ShipmentNumber) -> Result<LabelDocument, CarrierError>;
}
