//! Order persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::prelude::FromRow;

use marram_core::{OrderId, OrderStatus};

use super::StoreError;
use crate::models::order::{Destination, NewOrder, Order};
use crate::services::orders::OrderStore;

#[derive(FromRow)]
struct InsertedOrder {
    id: i32,
    created_at: DateTime<Utc>,
}

/// `PostgreSQL`-backed order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create an order store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for PgOrderStore {
    async fn highest_sequence(&self) -> Result<Option<u32>, StoreError> {
        let max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(number_seq) FROM storefront.orders")
                .fetch_one(&self.pool)
                .await?;
        Ok(max.and_then(|v| u32::try_from(v).ok()))
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let number_seq = order.number.sequence().and_then(|s| i32::try_from(s).ok());
        let Destination {
            recipient,
            line1,
            line2,
            city,
            postal_code,
            country,
            pickup_point_id,
        } = &order.destination;

        let inserted: InsertedOrder = sqlx::query_as(
            "INSERT INTO storefront.orders
                 (number, number_seq, user_id, status, recipient, line1, line2,
                  city, postal_code, country, shipping_method_name,
                  shipping_cost_cents, pickup_point_id, subtotal_cents,
                  total_weight_grams, total_cents)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING id, created_at",
        )
        .bind(order.number.as_str())
        .bind(number_seq)
        .bind(order.user_id.map(|v| v.as_i32()))
        .bind(OrderStatus::Pending.as_str())
        .bind(recipient)
        .bind(line1)
        .bind(line2.as_deref())
        .bind(city)
        .bind(postal_code)
        .bind(country.as_str())
        .bind(&order.shipping_method_name)
        .bind(order.shipping_cost.cents())
        .bind(pickup_point_id.as_deref())
        .bind(order.subtotal.cents())
        .bind(order.total_weight.grams())
        .bind(order.total().cents())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, "order number"))?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO storefront.order_item
                     (order_id, product_id, variant_id, name, quantity,
                      unit_price_cents, unit_weight_grams)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(inserted.id)
            .bind(item.product_id.as_i32())
            .bind(item.variant_id.map(|v| v.as_i32()))
            .bind(&item.name)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.cents())
            .bind(item.unit_weight.grams())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::from_write(e, "order"))?;

        Ok(Order {
            id: OrderId::new(inserted.id),
            number: order.number.clone(),
            user_id: order.user_id,
            status: OrderStatus::Pending,
            destination: order.destination.clone(),
            shipping_method_name: order.shipping_method_name.clone(),
            shipping_cost: order.shipping_cost,
            shipment_number: None,
            subtotal: order.subtotal,
            total_weight: order.total_weight,
            total: order.total(),
            created_at: inserted.created_at,
        })
    }
}
