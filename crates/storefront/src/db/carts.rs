//! Cart repository for database operations.
//!
//! The merge operation runs as a single SERIALIZABLE transaction: losing a
//! race with a concurrent cart mutation surfaces as
//! [`StoreError::Conflict`] for the merge engine to retry.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::prelude::FromRow;

use marram_core::{CartId, CartItemId, GuestToken, ProductId, UserId, VariantId};

use super::StoreError;
use crate::models::cart::{Cart, CartItem, CartOwner, MergeOutcome};
use crate::services::cart::CartStore;

const CART_COLUMNS: &str = "id, user_id, session_token, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, cart_id, product_id, variant_id, quantity";

#[derive(FromRow)]
struct CartRow {
    id: i32,
    user_id: Option<i32>,
    session_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn into_cart(self) -> Result<Cart, StoreError> {
        let owner = match (self.user_id, self.session_token) {
            (Some(user), None) => CartOwner::User(UserId::new(user)),
            (None, Some(token)) => CartOwner::Guest(GuestToken::from(token)),
            _ => {
                return Err(StoreError::DataCorruption(format!(
                    "cart {} must have exactly one owner key",
                    self.id
                )));
            }
        };
        Ok(Cart {
            id: CartId::new(self.id),
            owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    variant_id: Option<i32>,
    quantity: i32,
}

impl CartItemRow {
    fn into_item(self) -> Result<CartItem, StoreError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            StoreError::DataCorruption(format!("cart item {} has negative quantity", self.id))
        })?;
        Ok(CartItem {
            id: CartItemId::new(self.id),
            cart_id: CartId::new(self.cart_id),
            product_id: ProductId::new(self.product_id),
            variant_id: self.variant_id.map(VariantId::new),
            quantity,
        })
    }
}

/// `PostgreSQL`-backed cart store.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a cart store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CartStore for PgCartStore {
    async fn find_by_user(&self, user: UserId) -> Result<Option<Cart>, StoreError> {
        let row: Option<CartRow> = sqlx::query_as(&format!(
            "SELECT {CART_COLUMNS} FROM storefront.cart WHERE user_id = $1"
        ))
        .bind(user.as_i32())
        .fetch_optional(&self.pool)
        .await?;
        row.map(CartRow::into_cart).transpose()
    }

    async fn find_by_token(&self, token: &GuestToken) -> Result<Option<Cart>, StoreError> {
        let row: Option<CartRow> = sqlx::query_as(&format!(
            "SELECT {CART_COLUMNS} FROM storefront.cart WHERE session_token = $1"
        ))
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(CartRow::into_cart).transpose()
    }

    async fn create(&self, owner: &CartOwner) -> Result<Cart, StoreError> {
        let (user_id, token) = match owner {
            CartOwner::User(user) => (Some(user.as_i32()), None),
            CartOwner::Guest(token) => (None, Some(token.as_str())),
        };
        let row: CartRow = sqlx::query_as(&format!(
            "INSERT INTO storefront.cart (user_id, session_token)
             VALUES ($1, $2)
             RETURNING {CART_COLUMNS}"
        ))
        .bind(user_id)
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_write(e, "cart"))?;
        row.into_cart()
    }

    async fn items(&self, cart: CartId) -> Result<Vec<CartItem>, StoreError> {
        let rows: Vec<CartItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM storefront.cart_item WHERE cart_id = $1 ORDER BY id"
        ))
        .bind(cart.as_i32())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CartItemRow::into_item).collect()
    }

    async fn upsert_item(
        &self,
        cart: CartId,
        product: ProductId,
        variant: Option<VariantId>,
        quantity: u32,
    ) -> Result<CartItem, StoreError> {
        let row: CartItemRow = sqlx::query_as(&format!(
            "INSERT INTO storefront.cart_item (cart_id, product_id, variant_id, quantity)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (cart_id, product_id, COALESCE(variant_id, 0))
             DO UPDATE SET quantity = cart_item.quantity + EXCLUDED.quantity
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(cart.as_i32())
        .bind(product.as_i32())
        .bind(variant.map(|v| v.as_i32()))
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_write(e, "cart item"))?;

        sqlx::query("UPDATE storefront.cart SET updated_at = now() WHERE id = $1")
            .bind(cart.as_i32())
            .execute(&self.pool)
            .await?;
        row.into_item()
    }

    async fn set_item_quantity(
        &self,
        cart: CartId,
        item: CartItemId,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE storefront.cart_item SET quantity = $1 WHERE id = $2 AND cart_id = $3",
        )
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .bind(item.as_i32())
        .bind(cart.as_i32())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn remove_item(&self, cart: CartId, item: CartItemId) -> Result<(), StoreError> {
        let result =
            sqlx::query("DELETE FROM storefront.cart_item WHERE id = $1 AND cart_id = $2")
                .bind(item.as_i32())
                .bind(cart.as_i32())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_cart(&self, cart: CartId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM storefront.cart WHERE id = $1")
            .bind(cart.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn merge_guest_cart(
        &self,
        token: &GuestToken,
        user: UserId,
    ) -> Result<MergeOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let guest: Option<CartRow> = sqlx::query_as(&format!(
            "SELECT {CART_COLUMNS} FROM storefront.cart WHERE session_token = $1 FOR UPDATE"
        ))
        .bind(token.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(guest) = guest else {
            tx.rollback().await?;
            return Ok(MergeOutcome::NoGuestCart);
        };

        let target: Option<CartRow> = sqlx::query_as(&format!(
            "SELECT {CART_COLUMNS} FROM storefront.cart WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(target) = target else {
            // O(1) re-own: rename the key, keep the item rows.
            sqlx::query(
                "UPDATE storefront.cart
                 SET user_id = $1, session_token = NULL, updated_at = now()
                 WHERE id = $2",
            )
            .bind(user.as_i32())
            .bind(guest.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "cart ownership"))?;
            tx.commit()
                .await
                .map_err(|e| StoreError::from_write(e, "cart merge"))?;
            return Ok(MergeOutcome::Reassigned {
                cart: CartId::new(guest.id),
            });
        };

        let guest_items: Vec<CartItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM storefront.cart_item WHERE cart_id = $1 ORDER BY id"
        ))
        .bind(guest.id)
        .fetch_all(&mut *tx)
        .await?;
        let existing_keys: HashSet<(i32, Option<i32>)> = sqlx::query_as::<_, CartItemRow>(
            &format!(
                "SELECT {ITEM_COLUMNS} FROM storefront.cart_item WHERE cart_id = $1 FOR UPDATE"
            ),
        )
        .bind(target.id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| (row.product_id, row.variant_id))
        .collect();

        let mut lines_moved = 0;
        let mut lines_combined = 0;
        for item in guest_items {
            if existing_keys.contains(&(item.product_id, item.variant_id)) {
                sqlx::query(
                    "UPDATE storefront.cart_item SET quantity = quantity + $1
                     WHERE cart_id = $2 AND product_id = $3
                       AND variant_id IS NOT DISTINCT FROM $4",
                )
                .bind(item.quantity)
                .bind(target.id)
                .bind(item.product_id)
                .bind(item.variant_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::from_write(e, "cart line"))?;
                lines_combined += 1;
            } else {
                sqlx::query("UPDATE storefront.cart_item SET cart_id = $1 WHERE id = $2")
                    .bind(target.id)
                    .bind(item.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StoreError::from_write(e, "cart line"))?;
                lines_moved += 1;
            }
        }

        sqlx::query("DELETE FROM storefront.cart WHERE id = $1")
            .bind(guest.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE storefront.cart SET updated_at = now() WHERE id = $1")
            .bind(target.id)
            .execute(&mut *tx)
            .await?;
        tx.commit()
            .await
            .map_err(|e| StoreError::from_write(e, "cart merge"))?;

        Ok(MergeOutcome::Merged {
            into: CartId::new(target.id),
            lines_moved,
            lines_combined,
        })
    }
}
