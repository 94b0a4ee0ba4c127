//! Cart domain types.

use chrono::{DateTime, Utc};

use marram_core::{CartId, CartItemId, GuestToken, ProductId, UserId, VariantId};

/// The single active key a cart is owned by.
///
/// A cart belongs to either a logged-in user or an anonymous session, never
/// both. Login transfers ownership (or merges) rather than adding a second
/// key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    /// Cart keyed on a user id.
    User(UserId),
    /// Cart keyed on an opaque guest session token.
    Guest(GuestToken),
}

impl CartOwner {
    /// The user id, if this cart belongs to a logged-in user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }
}

/// A shopping cart.
///
/// Carts are created lazily on the first add-to-cart action. A cart with
/// zero items is "empty" but is not deleted automatically; it is removed
/// when its order is finalized or absorbed by a merge.
#[derive(Debug, Clone)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Current owner key.
    pub owner: CartOwner,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
    /// When the cart was last modified.
    pub updated_at: DateTime<Utc>,
}

/// A line in a cart.
///
/// Unique per (cart, product, variant); adding the same combination again
/// increments the quantity instead of creating a second row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Unique item ID.
    pub id: CartItemId,
    /// Owning cart.
    pub cart_id: CartId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Referenced variant, if the shopper picked one.
    pub variant_id: Option<VariantId>,
    /// Quantity, always >= 1.
    pub quantity: u32,
}

impl CartItem {
    /// The (product, variant) key that identifies a line within a cart.
    #[must_use]
    pub const fn line_key(&self) -> (ProductId, Option<VariantId>) {
        (self.product_id, self.variant_id)
    }
}

/// Result of merging a guest cart into a user's account at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No guest cart existed; nothing to do.
    NoGuestCart,
    /// The user had no cart, so the guest cart was re-owned in place.
    Reassigned {
        /// The cart that now belongs to the user.
        cart: CartId,
    },
    /// Guest lines were folded into the user's existing cart.
    Merged {
        /// The surviving user cart.
        into: CartId,
        /// Lines that moved over as new rows.
        lines_moved: u32,
        /// Lines whose quantities were summed into existing rows.
        lines_combined: u32,
    },
}
