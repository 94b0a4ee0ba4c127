//! Status enums for orders.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Orders are immutable snapshots; only the status and shipment fields may
/// change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, payment confirmed, not yet handed to a carrier.
    #[default]
    Pending,
    /// Payment settled.
    Paid,
    /// A shipment has been booked with a carrier.
    Shipped,
    /// Cancelled by staff; never deleted.
    Cancelled,
}

impl OrderStatus {
    /// Stable string form used for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the stable string form.
    #[must_use]
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "shipped" => Some(Self::Shipped),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
