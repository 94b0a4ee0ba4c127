//! Shipment booking and label retrieval.
//!
//! A small state machine keyed on the order's persisted shipment number:
//!
//! ```text
//! NoShipment --(request label, create=true, pickup point set)--> ShipmentBooked
//! ```
//!
//! Booking is idempotent: once a shipment number is persisted it is the
//! source of truth for "already booked", and a second `create=true` request
//! only re-fetches the label. Carrier failures are surfaced, never retried
//! here - the admin re-clicks.

use thiserror::Error;
use tracing::instrument;

use marram_core::OrderId;

use crate::carrier::{
    CarrierApi, CarrierError, CreateShipmentRequest, ShipmentNumber, StoreAddress,
};
use crate::db::StoreError;
use crate::models::order::OrderShipment;

/// Persistence this component needs from orders.
#[allow(async_fn_in_trait)]
pub trait ShipmentStore {
    /// The shipment-relevant slice of an order.
    async fn find_order(&self, order: OrderId) -> Result<Option<OrderShipment>, StoreError>;

    /// Persist the carrier's shipment number (and mark the order shipped).
    async fn record_shipment(
        &self,
        order: OrderId,
        shipment: &ShipmentNumber,
    ) -> Result<(), StoreError>;
}

/// Errors from label requests.
#[derive(Debug, Error)]
pub enum LabelError {
    /// No such order.
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),

    /// Booking requires a pickup point and the order has none.
    #[error("order has no pickup point selected")]
    MissingPickupPoint,

    /// The label was requested without `create` before any shipment exists.
    #[error("no shipment booked for this order yet")]
    NoShipmentYet,

    /// The carrier call failed; see [`CarrierError`] for transport vs.
    /// rejection.
    #[error(transparent)]
    Carrier(#[from] CarrierError),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A label ready to stream to the admin's browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Document bytes.
    pub bytes: Vec<u8>,
    /// MIME type.
    pub content_type: String,
    /// Suggested filename embedding the order number.
    pub filename: String,
}

/// Books shipments and fetches labels, idempotently.
#[derive(Debug, Clone)]
pub struct ShipmentLabelManager<S, C> {
    orders: S,
    carrier: C,
    sender: StoreAddress,
}

impl<S, C> ShipmentLabelManager<S, C>
where
    S: ShipmentStore,
    C: CarrierApi,
{
    /// Create a label manager with the store's configured sender address.
    pub const fn new(orders: S, carrier: C, sender: StoreAddress) -> Self {
        Self {
            orders,
            carrier,
            sender,
        }
    }

    /// Fetch the order's label, booking the shipment first when `create` is
    /// set and no shipment exists yet.
    ///
    /// # Errors
    ///
    /// - [`LabelError::UnknownOrder`] when the order does not exist
    /// - [`LabelError::MissingPickupPoint`] on `create=true` without a
    ///   pickup point; the carrier is not contacted
    /// - [`LabelError::NoShipmentYet`] on `create=false` before booking
    /// - [`LabelError::Carrier`] when the carrier call fails
    #[instrument(skip(self))]
    pub async fn request_label(&self, order: OrderId, create: bool) -> Result<Label, LabelError> {
        let order = self
            .orders
            .find_order(order)
            .await?
            .ok_or(LabelError::UnknownOrder(order))?;

        let shipment = match (&order.shipment_number, create) {
            // Already booked: never rebook, regardless of the create flag.
            (Some(shipment), _) => shipment.clone(),
            (None, false) => return Err(LabelError::NoShipmentYet),
            (None, true) => self.book_shipment(&order).await?,
        };

        let document = self.carrier.fetch_label(&shipment).await?;
        Ok(Label {
            filename: format!("label-{}.{}", order.number, document.extension),
            content_type: document.content_type,
            bytes: document.bytes,
        })
    }

    async fn book_shipment(&self, order: &OrderShipment) -> Result<ShipmentNumber, LabelError> {
        let pickup_point_id = order
            .pickup_point_id
            .as_deref()
            .ok_or(LabelError::MissingPickupPoint)?;

        let shipment = self
            .carrier
            .create_shipment(&CreateShipmentRequest {
                order_number: &order.number,
                sender: &self.sender,
                pickup_point_id,
            })
            .await?;
        self.orders.record_shipment(order.id, &shipment).await?;
        tracing::info!(order = %order.number, %shipment, "shipment booked");
        Ok(shipment)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;
    use marram_core::{CountryCode, OrderNumber, OrderStatus};

    use crate::carrier::LabelDocument;

    #[derive(Clone, Default)]
    struct FakeShipmentStore {
        orders: Arc<Mutex<Vec<OrderShipment>>>,
    }

    impl FakeShipmentStore {
        fn with_order(pickup_point: Option<&str>, shipment: Option<&str>) -> Self {
            let store = Self::default();
            store.orders.lock().expect("lock").push(OrderShipment {
                id: OrderId::new(1),
                number: OrderNumber::compose("MR", 100_042),
                status: OrderStatus::Pending,
                pickup_point_id: pickup_point.map(str::to_owned),
                shipment_number: shipment.map(|s| ShipmentNumber::from(s.to_owned())),
                created_at: Utc::now(),
            });
            store
        }

        fn shipment_of(&self, order: OrderId) -> Option<ShipmentNumber> {
            self.orders
                .lock()
                .expect("lock")
                .iter()
                .find(|o| o.id == order)
                .and_then(|o| o.shipment_number.clone())
        }
    }

    impl ShipmentStore for FakeShipmentStore {
        async fn find_order(&self, order: OrderId) -> Result<Option<OrderShipment>, StoreError> {
            Ok(self
                .orders
                .lock()
                .expect("lock")
                .iter()
                .find(|o| o.id == order)
                .cloned())
        }

        async fn record_shipment(
            &self,
            order: OrderId,
            shipment: &ShipmentNumber,
        ) -> Result<(), StoreError> {
            let mut orders = self.orders.lock().expect("lock");
            let entry = orders
                .iter_mut()
                .find(|o| o.id == order)
                .ok_or(StoreError::NotFound)?;
            entry.shipment_number = Some(shipment.clone());
            entry.status = OrderStatus::Shipped;
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeCarrier {
        bookings: Arc<Mutex<u32>>,
        label_fetches: Arc<Mutex<u32>>,
        reject_bookings: bool,
    }

    impl FakeCarrier {
        fn bookings(&self) -> u32 {
            *self.bookings.lock().expect("lock")
        }

        fn label_fetches(&self) -> u32 {
            *self.label_fetches.lock().expect("lock")
        }
    }

    impl CarrierApi for FakeCarrier {
        async fn create_shipment(
            &self,
            request: &CreateShipmentRequest<'_>,
        ) -> Result<ShipmentNumber, CarrierError> {
            *self.bookings.lock().expect("lock") += 1;
            if self.reject_bookings {
                return Err(CarrierError::Rejected {
                    status: 422,
                    message: "unknown pickup point".to_owned(),
                });
            }
            Ok(ShipmentNumber::from(format!(
                "SHIP-{}",
                request.order_number
            )))
        }

        async fn fetch_label(
            &self,
            shipment: &ShipmentNumber,
        ) -> Result<LabelDocument, CarrierError> {
            *self.label_fetches.lock().expect("lock") += 1;
            Ok(LabelDocument {
                bytes: format!("%PDF {shipment}").into_bytes(),
                content_type: "application/pdf".to_owned(),
                extension: "pdf".to_owned(),
            })
        }
    }

    fn sender() -> StoreAddress {
        StoreAddress {
            name: "Marram Goods".to_owned(),
            line1: "2 Harbour Road".to_owned(),
            line2: None,
            city: "Haven".to_owned(),
            postal_code: "1011".to_owned(),
            country: CountryCode::parse("NL").expect("country"),
            phone: "+31 20 000 0000".to_owned(),
            email: Some("shop@marram.example".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_create_books_then_fetches() {
        let store = FakeShipmentStore::with_order(Some("PP-7"), None);
        let carrier = FakeCarrier::default();
        let manager = ShipmentLabelManager::new(store.clone(), carrier.clone(), sender());

        let label = manager
            .request_label(OrderId::new(1), true)
            .await
            .expect("label");
        assert_eq!(label.filename, "label-MR-100042.pdf");
        assert_eq!(label.content_type, "application/pdf");
        assert_eq!(carrier.bookings(), 1);
        assert_eq!(carrier.label_fetches(), 1);
        // The shipment number is persisted for the next request.
        assert!(store.shipment_of(OrderId::new(1)).is_some());
    }

    #[tokio::test]
    async fn test_missing_pickup_point_makes_no_carrier_call() {
        let store = FakeShipmentStore::with_order(None, None);
        let carrier = FakeCarrier::default();
        let manager = ShipmentLabelManager::new(store, carrier.clone(), sender());

        let err = manager
            .request_label(OrderId::new(1), true)
            .await
            .expect_err("must fail");
        assert!(matches!(err, LabelError::MissingPickupPoint));
        assert_eq!(carrier.bookings(), 0);
        assert_eq!(carrier.label_fetches(), 0);
    }

    #[tokio::test]
    async fn test_fetch_before_booking_fails() {
        let store = FakeShipmentStore::with_order(Some("PP-7"), None);
        let carrier = FakeCarrier::default();
        let manager = ShipmentLabelManager::new(store, carrier.clone(), sender());

        let err = manager
            .request_label(OrderId::new(1), false)
            .await
            .expect_err("must fail");
        assert!(matches!(err, LabelError::NoShipmentYet));
        assert_eq!(carrier.label_fetches(), 0);
    }

    #[tokio::test]
    async fn test_double_create_books_once_fetches_twice() {
        let store = FakeShipmentStore::with_order(Some("PP-7"), None);
        let carrier = FakeCarrier::default();
        let manager = ShipmentLabelManager::new(store, carrier.clone(), sender());

        manager
            .request_label(OrderId::new(1), true)
            .await
            .expect("first");
        manager
            .request_label(OrderId::new(1), true)
            .await
            .expect("second");
        assert_eq!(carrier.bookings(), 1);
        assert_eq!(carrier.label_fetches(), 2);
    }

    #[tokio::test]
    async fn test_fetch_existing_label_without_create() {
        let store = FakeShipmentStore::with_order(Some("PP-7"), Some("SHIP-1"));
        let carrier = FakeCarrier::default();
        let manager = ShipmentLabelManager::new(store, carrier.clone(), sender());

        let label = manager
            .request_label(OrderId::new(1), false)
            .await
            .expect("label");
        assert_eq!(carrier.bookings(), 0);
        assert_eq!(carrier.label_fetches(), 1);
        assert_eq!(label.bytes, b"%PDF SHIP-1".to_vec());
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let store = FakeShipmentStore::default();
        let manager = ShipmentLabelManager::new(store, FakeCarrier::default(), sender());

        let err = manager
            .request_label(OrderId::new(9), false)
            .await
            .expect_err("must fail");
        assert!(matches!(err, LabelError::UnknownOrder(_)));
    }

    #[tokio::test]
    async fn test_carrier_rejection_is_surfaced_and_nothing_is_persisted() {
        let store = FakeShipmentStore::with_order(Some("PP-7"), None);
        let carrier = FakeCarrier {
            reject_bookings: true,
            ..FakeCarrier::default()
        };
        let manager = ShipmentLabelManager::new(store.clone(), carrier.clone(), sender());

        let err = manager
            .request_label(OrderId::new(1), true)
            .await
            .expect_err("must fail");
        assert!(matches!(
            err,
            LabelError::Carrier(CarrierError::Rejected { status: 422, .. })
        ));
        // No shipment number was persisted; a later retry re-books.
        assert!(store.shipment_of(OrderId::new(1)).is_none());
        assert_eq!(carrier.label_fetches(), 0);
    }
}
