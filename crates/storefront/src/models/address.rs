//! User address book types.

use chrono::{DateTime, Utc};

use marram_core::{AddressId, CountryCode, UserId};

/// A user-owned address.
///
/// Each user has at most one default shipping and one default billing
/// address. Exclusivity is enforced by write-side sequencing (unset all,
/// then set one, inside a transaction), not by a database constraint.
#[derive(Debug, Clone)]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// Owning user.
    pub user_id: UserId,
    /// Recipient name.
    pub recipient: String,
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
    /// Default for shipping.
    pub is_default_shipping: bool,
    /// Default for billing.
    pub is_default_billing: bool,
    /// When the address was created.
    pub created_at: DateTime<Utc>,
}

/// Data for a new address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    /// Recipient name.
    pub recipient: String,
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
}
