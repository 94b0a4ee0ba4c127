//! Checkout aggregation: the priced, weighed view of a cart.

use thiserror::Error;
use tracing::instrument;

use marram_core::{CartId, Money, ProductId, VariantId, Weight};

use crate::db::StoreError;
use crate::models::cart::CartItem;
use crate::models::catalog::LineSnapshot;
use crate::services::cart::CartStore;

/// Read access to product/variant pricing data.
#[allow(async_fn_in_trait)]
pub trait CatalogStore {
    /// The pricing snapshot for a (product, variant) pair.
    ///
    /// Returns `None` when the product does not exist, or when a variant is
    /// given that does not belong to the product.
    async fn line_snapshot(
        &self,
        product: ProductId,
        variant: Option<VariantId>,
    ) -> Result<Option<LineSnapshot>, StoreError>;

    /// Whether the (product, variant) pair exists.
    async fn line_exists(
        &self,
        product: ProductId,
        variant: Option<VariantId>,
    ) -> Result<bool, StoreError> {
        Ok(self.line_snapshot(product, variant).await?.is_some())
    }
}

/// Errors from checkout aggregation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no items; callers should redirect instead of rendering
    /// a zero-value summary.
    #[error("cart is empty, no checkout possible")]
    EmptyCart,

    /// A cart line references a product or variant that no longer exists.
    #[error("cart references unknown product {product} / variant {variant:?}")]
    UnknownProduct {
        /// Referenced product.
        product: ProductId,
        /// Referenced variant.
        variant: Option<VariantId>,
    },

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The cart-level inputs a shipping rate computation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum of effective line prices.
    pub subtotal: Money,
    /// Sum of effective line weights.
    pub total_weight: Weight,
}

/// One priced line of a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    /// The underlying cart item.
    pub item: CartItem,
    /// Display name at aggregation time.
    pub name: String,
    /// Effective unit price (variant override or product price).
    pub unit_price: Money,
    /// Effective unit weight (variant override or product weight).
    pub unit_weight: Weight,
}

impl CheckoutLine {
    /// Price times quantity.
    #[must_use]
    pub const fn line_total(&self) -> Money {
        self.unit_price.times(self.item.quantity)
    }

    /// Weight times quantity.
    #[must_use]
    pub const fn line_weight(&self) -> Weight {
        self.unit_weight.times(self.item.quantity)
    }
}

/// The denormalized view of a cart ready for checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSummary {
    /// Priced lines.
    pub lines: Vec<CheckoutLine>,
    /// Sum of line totals.
    pub subtotal: Money,
    /// Sum of line weights.
    pub total_weight: Weight,
}

impl CheckoutSummary {
    /// The totals needed by the shipping rate engine.
    #[must_use]
    pub const fn totals(&self) -> CartTotals {
        CartTotals {
            subtotal: self.subtotal,
            total_weight: self.total_weight,
        }
    }
}

/// Computes the checkout view of a resolved cart.
#[derive(Debug, Clone)]
pub struct CheckoutAggregator<S, C> {
    carts: S,
    catalog: C,
}

impl<S, C> CheckoutAggregator<S, C>
where
    S: CartStore,
    C: CatalogStore,
{
    /// Create an aggregator.
    pub const fn new(carts: S, catalog: C) -> Self {
        Self { carts, catalog }
    }

    /// Price and weigh every line of the cart.
    ///
    /// The effective price and weight are chosen independently per field:
    /// a variant that overrides only the price still uses the product's
    /// weight.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] when the cart has no items
    /// - [`CheckoutError::UnknownProduct`] when a line's catalog data is gone
    #[instrument(skip(self))]
    pub async fn summarize(&self, cart: CartId) -> Result<CheckoutSummary, CheckoutError> {
        let items = self.carts.items(cart).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let snapshot = self
                .catalog
                .line_snapshot(item.product_id, item.variant_id)
                .await?
                .ok_or(CheckoutError::UnknownProduct {
                    product: item.product_id,
                    variant: item.variant_id,
                })?;
            lines.push(to_line(item, &snapshot));
        }

        let subtotal = lines.iter().map(CheckoutLine::line_total).sum();
        let total_weight = lines.iter().map(CheckoutLine::line_weight).sum();
        Ok(CheckoutSummary {
            lines,
            subtotal,
            total_weight,
        })
    }
}

fn to_line(item: CartItem, snapshot: &LineSnapshot) -> CheckoutLine {
    CheckoutLine {
        name: snapshot.display_name(),
        unit_price: snapshot.effective_price(),
        unit_weight: snapshot.effective_weight(),
        item,
    }
}
