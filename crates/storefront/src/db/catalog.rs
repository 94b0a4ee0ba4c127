//! Catalog snapshot reads for checkout pricing.

use sqlx::PgPool;
use sqlx::prelude::FromRow;

use marram_core::{Money, ProductId, VariantId, Weight};

use super::StoreError;
use crate::models::catalog::{LineSnapshot, ProductSnapshot, VariantSnapshot};
use crate::services::checkout::CatalogStore;

#[derive(FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price_cents: i64,
    weight_grams: i64,
}

#[derive(FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    name: String,
    price_cents: Option<i64>,
    weight_grams: Option<i64>,
}

/// `PostgreSQL`-backed catalog store.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a catalog store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for PgCatalogStore {
    async fn line_snapshot(
        &self,
        product: ProductId,
        variant: Option<VariantId>,
    ) -> Result<Option<LineSnapshot>, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, price_cents, weight_grams FROM storefront.product WHERE id = $1",
        )
        .bind(product.as_i32())
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let product = ProductSnapshot {
            id: ProductId::new(row.id),
            name: row.name,
            price: Money::from_cents(row.price_cents),
            weight: Weight::from_grams(row.weight_grams),
        };

        let variant = match variant {
            None => None,
            Some(id) => {
                // The variant must belong to the requested product; a
                // mismatched pair is treated as unknown, not as the product
                // alone.
                let row: Option<VariantRow> = sqlx::query_as(
                    "SELECT id, product_id, name, price_cents, weight_grams
                     FROM storefront.product_variant
                     WHERE id = $1 AND product_id = $2",
                )
                .bind(id.as_i32())
                .bind(product.id.as_i32())
                .fetch_optional(&self.pool)
                .await?;
                match row {
                    Some(row) => Some(VariantSnapshot {
                        id: VariantId::new(row.id),
                        product_id: ProductId::new(row.product_id),
                        name: row.name,
                        price: row.price_cents.map(Money::from_cents),
                        weight: row.weight_grams.map(Weight::from_grams),
                    }),
                    None => return Ok(None),
                }
            }
        };

        Ok(Some(LineSnapshot { product, variant }))
    }
}
