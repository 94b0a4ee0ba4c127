//! Product and variant pricing snapshots.
//!
//! The checkout pipeline never needs full catalog entities, only the price
//! and weight data for the lines in a cart. A variant overrides the product
//! value per field: if the variant's price is set it wins, otherwise the
//! product price applies, and the same rule holds independently for weight.

use marram_core::{Money, ProductId, VariantId, Weight};

/// Price/weight data for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Base price.
    pub price: Money,
    /// Base weight.
    pub weight: Weight,
}

/// Price/weight overrides for a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSnapshot {
    /// Variant ID.
    pub id: VariantId,
    /// Owning product.
    pub product_id: ProductId,
    /// Display name (e.g. "500 g", "Blue").
    pub name: String,
    /// Price override; `None` falls back to the product price.
    pub price: Option<Money>,
    /// Weight override; `None` falls back to the product weight.
    pub weight: Option<Weight>,
}

/// The data needed to price one cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSnapshot {
    /// The product.
    pub product: ProductSnapshot,
    /// The chosen variant, if any.
    pub variant: Option<VariantSnapshot>,
}

impl LineSnapshot {
    /// The effective unit price: variant override if set, else product price.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        self.variant
            .as_ref()
            .and_then(|v| v.price)
            .unwrap_or(self.product.price)
    }

    /// The effective unit weight: variant override if set, else product weight.
    #[must_use]
    pub fn effective_weight(&self) -> Weight {
        self.variant
            .as_ref()
            .and_then(|v| v.weight)
            .unwrap_or(self.product.weight)
    }

    /// Display name combining product and variant.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{} ({})", self.product.name, variant.name),
            None => self.product.name.clone(),
        }
    }
}
