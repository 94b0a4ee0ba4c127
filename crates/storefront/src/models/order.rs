//! Order domain types.
//!
//! Orders are immutable snapshots taken at checkout completion: item prices
//! and weights are copied from the catalog at creation time and never
//! recomputed from live products. Only the status and shipment fields change
//! afterwards.

use chrono::{DateTime, Utc};

use marram_core::{
    CountryCode, Money, OrderId, OrderNumber, OrderStatus, ProductId, UserId, VariantId, Weight,
};

/// Destination snapshot for an order.
#[derive(Debug, Clone)]
pub struct Destination {
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
    /// Destination country.
    pub country: CountryCode,
    /// Carrier pickup point chosen by the shopper, when the carrier
    /// delivers to pickup points.
    pub pickup_point_id: Option<String>,
}

/// A finalized order.
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Human-presentable order number.
    pub number: OrderNumber,
    /// Purchasing user, if the shopper was logged in.
    pub user_id: Option<UserId>,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Where the order ships.
    pub destination: Destination,
    /// Name of the chosen shipping method, copied at creation.
    pub shipping_method_name: String,
    /// Shipping cost, copied at creation.
    pub shipping_cost: Money,
    /// Carrier shipment number, set once a shipment is booked.
    pub shipment_number: Option<String>,
    /// Item subtotal at creation time.
    pub subtotal: Money,
    /// Total weight at creation time.
    pub total_weight: Weight,
    /// Subtotal plus shipping.
    pub total: Money,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// A line of a finalized order.
#[derive(Debug, Clone)]
pub struct OrderItem {
    /// Owning order.
    pub order_id: OrderId,
    /// Product reference (informational; pricing is snapshotted).
    pub product_id: ProductId,
    /// Variant reference, if one was chosen.
    pub variant_id: Option<VariantId>,
    /// Display name at creation time.
    pub name: String,
    /// Quantity.
    pub quantity: u32,
    /// Unit price at creation time.
    pub unit_price: Money,
    /// Unit weight at creation time.
    pub unit_weight: Weight,
}

/// Data for an order about to be persisted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Candidate order number; the store enforces uniqueness.
    pub number: OrderNumber,
    /// Purchasing user, if logged in.
    pub user_id: Option<UserId>,
    /// Destination snapshot.
    pub destination: Destination,
    /// Chosen method name.
    pub shipping_method_name: String,
    /// Shipping cost.
    pub shipping_cost: Money,
    /// Item subtotal.
    pub subtotal: Money,
    /// Total weight.
    pub total_weight: Weight,
    /// Line snapshots.
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Subtotal plus shipping.
    #[must_use]
    pub fn total(&self) -> Money {
        self.subtotal + self.shipping_cost
    }
}

/// A line of an order about to be persisted.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    /// Product reference.
    pub product_id: ProductId,
    /// Variant reference.
    pub variant_id: Option<VariantId>,
    /// Display name.
    pub name: String,
    /// Quantity.
    pub quantity: u32,
    /// Unit price.
    pub unit_price: Money,
    /// Unit weight.
    pub unit_weight: Weight,
}
