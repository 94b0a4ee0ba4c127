//! Carrier API request and response types.

use core::fmt;

use serde::{Deserialize, Serialize};

use marram_core::{CountryCode, OrderNumber};

/// A carrier-side shipment identifier.
///
/// Persisted on the order once booking succeeds; its presence is the source
/// of truth for "already booked".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentNumber(String);

impl ShipmentNumber {
    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShipmentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ShipmentNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The store's sender address, read from configuration.
#[derive(Debug, Clone, Serialize)]
pub struct StoreAddress {
    /// Store display name.
    pub name: String,
    /// Street address.
    pub line1: String,
    /// Additional address line.
    pub line2: Option<String>,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: CountryCode,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: Option<String>,
}

/// A shipment booking request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateShipmentRequest<'a> {
    /// The order's human-presentable number (the carrier's reference).
    pub order_number: &'a OrderNumber,
    /// Where the parcel ships from.
    pub sender: &'a StoreAddress,
    /// The destination pickup point chosen by the shopper.
    pub pickup_point_id: &'a str,
}

/// A label document returned by the carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDocument {
    /// Decoded document bytes.
    pub bytes: Vec<u8>,
    /// MIME type for the response.
    pub content_type: String,
    /// File extension for the suggested filename.
    pub extension: String,
}
