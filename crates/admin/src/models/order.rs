//! The back office's view of an order.

use chrono::{DateTime, Utc};

use marram_core::{OrderId, OrderNumber, OrderStatus};

use crate::carrier::ShipmentNumber;

/// The shipment-relevant slice of an order.
///
/// `shipment_number` is the state machine's key: `None` means no shipment
/// has been booked; `Some` means booking already happened and must not be
/// repeated.
#[derive(Debug, Clone)]
pub struct OrderShipment {
    /// Order ID.
    pub id: OrderId,
    /// Human-presentable order number (used in label filenames).
    pub number: OrderNumber,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Destination pickup point chosen at checkout, if any.
    pub pickup_point_id: Option<String>,
    /// Carrier shipment number once booked.
    pub shipment_number: Option<ShipmentNumber>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}
