//! Order numbering and order placement.

use thiserror::Error;
use tracing::instrument;

use marram_core::OrderNumber;

use crate::db::StoreError;
use crate::models::cart::Cart;
use crate::models::order::{Destination, NewOrder, NewOrderItem, Order};
use crate::services::cart::CartStore;
use crate::services::checkout::CheckoutSummary;
use crate::services::shipping::RateQuote;

/// First sequence value ever issued.
const FIRST_SEQUENCE: u32 = 100_001;

/// Bounded attempts before a numbering conflict becomes a hard failure.
const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// Persistence operations for orders.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// The highest order-number sequence issued so far, if any.
    async fn highest_sequence(&self) -> Result<Option<u32>, StoreError>;

    /// Persist an order and its items atomically.
    ///
    /// Returns [`StoreError::Conflict`] if the order number is already
    /// taken, so the caller can regenerate and retry.
    async fn insert(&self, order: &NewOrder) -> Result<Order, StoreError>;
}

/// Errors from order placement.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The chosen method ships to pickup points but none was selected.
    #[error("shipping method requires a pickup point")]
    MissingPickupPoint,

    /// Numbering kept colliding with concurrent checkouts; the client may
    /// retry the whole confirmation.
    #[error("could not allocate a unique order number")]
    NumberContention,

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Produces short, sequential, human-presentable order numbers.
///
/// Numbers are synchronized against the last issued number rather than drawn
/// from randomness, so support staff can read them back to customers.
/// Uniqueness is ultimately enforced at insert time; collisions between
/// concurrent checkouts regenerate from the fresh high-water mark.
#[derive(Debug, Clone)]
pub struct OrderNumberGenerator<S> {
    store: S,
    prefix: String,
}

impl<S: OrderStore> OrderNumberGenerator<S> {
    /// Create a generator with the store's configured prefix.
    pub const fn new(store: S, prefix: String) -> Self {
        Self { store, prefix }
    }

    /// The next candidate number.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn next(&self) -> Result<OrderNumber, StoreError> {
        let sequence = self
            .store
            .highest_sequence()
            .await?
            .map_or(FIRST_SEQUENCE, |s| s.saturating_add(1));
        Ok(OrderNumber::compose(&self.prefix, sequence))
    }
}

/// Places orders after the (external) payment confirmation.
#[derive(Debug, Clone)]
pub struct OrderService<OS, CS> {
    orders: OS,
    carts: CS,
    numbers: OrderNumberGenerator<OS>,
}

impl<OS, CS> OrderService<OS, CS>
where
    OS: OrderStore + Clone,
    CS: CartStore,
{
    /// Create an order service.
    pub fn new(orders: OS, carts: CS, number_prefix: String) -> Self {
        Self {
            numbers: OrderNumberGenerator::new(orders.clone(), number_prefix),
            orders,
            carts,
        }
    }

    /// Persist the immutable order snapshot for a priced cart.
    ///
    /// Item prices and weights are copied from the summary and never
    /// recomputed. On success the cart is deleted best-effort: a failure is
    /// logged and reported but does not undo the order.
    ///
    /// # Errors
    ///
    /// - [`OrderError::MissingPickupPoint`] before any write when the chosen
    ///   method needs one
    /// - [`OrderError::NumberContention`] when numbering attempts are
    ///   exhausted
    #[instrument(skip(self, summary, quote, destination), fields(cart = %cart.id))]
    pub async fn place_order(
        &self,
        cart: &Cart,
        summary: &CheckoutSummary,
        quote: &RateQuote,
        destination: Destination,
    ) -> Result<Order, OrderError> {
        if quote.requires_pickup_point && destination.pickup_point_id.is_none() {
            return Err(OrderError::MissingPickupPoint);
        }

        let items: Vec<NewOrderItem> = summary
            .lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.item.product_id,
                variant_id: line.item.variant_id,
                name: line.name.clone(),
                quantity: line.item.quantity,
                unit_price: line.unit_price,
                unit_weight: line.unit_weight,
            })
            .collect();

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let number = self.numbers.next().await?;
            let new_order = NewOrder {
                number,
                user_id: cart.owner.user_id(),
                destination: destination.clone(),
                shipping_method_name: quote.name.clone(),
                shipping_cost: quote.cost,
                subtotal: summary.subtotal,
                total_weight: summary.total_weight,
                items: items.clone(),
            };
            match self.orders.insert(&new_order).await {
                Ok(order) => {
                    self.retire_cart(&order, cart).await;
                    return Ok(order);
                }
                Err(StoreError::Conflict(reason)) => {
                    tracing::warn!(%reason, attempt, "order number collided, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(OrderError::NumberContention)
    }

    /// Best-effort cart deletion once the order is finalized.
    async fn retire_cart(&self, order: &Order, cart: &Cart) {
        if let Err(err) = self.carts.delete_cart(cart.id).await {
            tracing::error!(
                order = %order.number,
                cart = %cart.id,
                error = %err,
                "failed to delete cart after order creation"
            );
        }
    }
}
