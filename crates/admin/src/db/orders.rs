//! Order shipment persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::prelude::FromRow;

use marram_core::{OrderId, OrderNumber, OrderStatus};

use super::StoreError;
use crate::carrier::ShipmentNumber;
use crate::models::order::OrderShipment;
use crate::services::labels::ShipmentStore;

#[derive(FromRow)]
struct OrderShipmentRow {
    id: i32,
    number: String,
    status: String,
    pickup_point_id: Option<String>,
    shipment_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderShipmentRow {
    fn into_order(self) -> Result<OrderShipment, StoreError> {
        let status = OrderStatus::from_str_opt(&self.status).ok_or_else(|| {
            StoreError::DataCorruption(format!(
                "order {} has unknown status {:?}",
                self.id, self.status
            ))
        })?;
        Ok(OrderShipment {
            id: OrderId::new(self.id),
            number: OrderNumber::from(self.number),
            status,
            pickup_point_id: self.pickup_point_id,
            shipment_number: self.shipment_number.map(ShipmentNumber::from),
            created_at: self.created_at,
        })
    }
}

/// `PostgreSQL`-backed shipment store.
#[derive(Clone)]
pub struct PgShipmentStore {
    pool: PgPool,
}

impl PgShipmentStore {
    /// Create a shipment store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ShipmentStore for PgShipmentStore {
    async fn find_order(&self, order: OrderId) -> Result<Option<OrderShipment>, StoreError> {
        let row: Option<OrderShipmentRow> = sqlx::query_as(
            "SELECT id, number, status, pickup_point_id, shipment_number, created_at
             FROM storefront.orders WHERE id = $1",
        )
        .bind(order.as_i32())
        .fetch_optional(&self.pool)
        .await?;
        row.map(OrderShipmentRow::into_order).transpose()
    }

    async fn record_shipment(
        &self,
        order: OrderId,
        shipment: &ShipmentNumber,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE storefront.orders SET shipment_number = $1, status = $2 WHERE id = $3",
        )
        .bind(shipment.as_str())
        .bind(OrderStatus::Shipped.as_str())
        .bind(order.as_i32())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
