//! Cart identity resolution and cart mutations.

use thiserror::Error;
use tracing::instrument;

use marram_core::{CartId, CartItemId, GuestToken, ProductId, UserId, VariantId};

use crate::db::StoreError;
use crate::models::cart::{Cart, CartItem, CartOwner, MergeOutcome};
use crate::models::session::CartIdentity;
use crate::services::checkout::CatalogStore;

/// Persistence operations for carts.
///
/// `merge_guest_cart` must be atomic: the whole merge happens in one
/// transaction (serializable or equivalent) and surfaces
/// [`StoreError::Conflict`] when it loses a race, so the engine can retry.
#[allow(async_fn_in_trait)]
pub trait CartStore {
    /// Cart owned by a user id, if any.
    async fn find_by_user(&self, user: UserId) -> Result<Option<Cart>, StoreError>;

    /// Cart owned by a guest token, if any.
    async fn find_by_token(&self, token: &GuestToken) -> Result<Option<Cart>, StoreError>;

    /// Create an empty cart for the given owner.
    async fn create(&self, owner: &CartOwner) -> Result<Cart, StoreError>;

    /// All items of a cart, in insertion order.
    async fn items(&self, cart: CartId) -> Result<Vec<CartItem>, StoreError>;

    /// Add quantity to the (product, variant) line, creating it if absent.
    async fn upsert_item(
        &self,
        cart: CartId,
        product: ProductId,
        variant: Option<VariantId>,
        quantity: u32,
    ) -> Result<CartItem, StoreError>;

    /// Set the quantity of an existing line.
    ///
    /// Returns [`StoreError::NotFound`] if the line does not belong to the
    /// cart.
    async fn set_item_quantity(
        &self,
        cart: CartId,
        item: CartItemId,
        quantity: u32,
    ) -> Result<(), StoreError>;

    /// Remove a line.
    async fn remove_item(&self, cart: CartId, item: CartItemId) -> Result<(), StoreError>;

    /// Delete a cart and its items.
    async fn delete_cart(&self, cart: CartId) -> Result<(), StoreError>;

    /// Merge the guest cart identified by `token` into `user`'s account, as
    /// one atomic operation. See [`MergeOutcome`] for the possible results.
    async fn merge_guest_cart(
        &self,
        token: &GuestToken,
        user: UserId,
    ) -> Result<MergeOutcome, StoreError>;
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity below 1.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// The product or variant does not exist (or the variant belongs to a
    /// different product).
    #[error("unknown product {product} / variant {variant:?}")]
    UnknownProduct {
        /// Requested product.
        product: ProductId,
        /// Requested variant.
        variant: Option<VariantId>,
    },

    /// A mutation addressed a cart that does not exist for this identity.
    #[error("no cart for this session")]
    NoCart,

    /// The addressed line does not exist in the resolved cart.
    #[error("no such cart item {0}")]
    UnknownItem(CartItemId),

    /// A cart mutation arrived with neither a user nor a guest token.
    #[error("cart mutation requires a user or guest identity")]
    MissingIdentity,

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves which cart a request should use.
///
/// Side-effect-free: read paths (cart page, checkout guard) must never
/// fabricate empty carts or session tokens merely by being visited.
#[derive(Debug, Clone)]
pub struct CartIdentityResolver<S> {
    store: S,
}

impl<S: CartStore> CartIdentityResolver<S> {
    /// Create a resolver over a cart store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The single cart for this identity: the user's cart if one exists,
    /// otherwise the guest cart, otherwise none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    #[instrument(skip(self, identity))]
    pub async fn resolve(&self, identity: &CartIdentity) -> Result<Option<Cart>, StoreError> {
        if let Some(user) = identity.user
            && let Some(cart) = self.store.find_by_user(user).await?
        {
            return Ok(Some(cart));
        }
        if let Some(token) = &identity.guest {
            return self.store.find_by_token(token).await;
        }
        Ok(None)
    }
}

/// A request to add a line to the cart.
#[derive(Debug, Clone, Copy)]
pub struct AddItem {
    /// Product to add.
    pub product: ProductId,
    /// Variant to add, if the shopper picked one.
    pub variant: Option<VariantId>,
    /// Quantity, must be >= 1.
    pub quantity: u32,
}

/// Cart mutations: the only code paths allowed to create carts.
#[derive(Debug, Clone)]
pub struct CartService<S, C> {
    resolver: CartIdentityResolver<S>,
    carts: S,
    catalog: C,
}

impl<S, C> CartService<S, C>
where
    S: CartStore + Clone,
    C: CatalogStore,
{
    /// Create a cart service.
    pub fn new(carts: S, catalog: C) -> Self {
        Self {
            resolver: CartIdentityResolver::new(carts.clone()),
            carts,
            catalog,
        }
    }

    /// The read-only resolver for this store.
    pub const fn resolver(&self) -> &CartIdentityResolver<S> {
        &self.resolver
    }

    /// Add a line to the identity's cart, creating the cart lazily.
    ///
    /// Adding an existing (product, variant) combination increments its
    /// quantity rather than duplicating the row.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] for quantity < 1, before any write
    /// - [`CartError::UnknownProduct`] if the product/variant pair is unknown
    /// - [`CartError::MissingIdentity`] if no identity was supplied
    #[instrument(skip(self, identity))]
    pub async fn add_item(
        &self,
        identity: &CartIdentity,
        request: AddItem,
    ) -> Result<(Cart, CartItem), CartError> {
        if request.quantity < 1 {
            return Err(CartError::InvalidQuantity(request.quantity));
        }
        let known = self
            .catalog
            .line_exists(request.product, request.variant)
            .await?;
        if !known {
            return Err(CartError::UnknownProduct {
                product: request.product,
                variant: request.variant,
            });
        }

        let cart = match self.resolver.resolve(identity).await? {
            Some(cart) => cart,
            None => {
                let owner = match (identity.user, &identity.guest) {
                    (Some(user), _) => CartOwner::User(user),
                    (None, Some(token)) => CartOwner::Guest(token.clone()),
                    (None, None) => return Err(CartError::MissingIdentity),
                };
                self.carts.create(&owner).await?
            }
        };

        let item = self
            .carts
            .upsert_item(cart.id, request.product, request.variant, request.quantity)
            .await?;
        Ok((cart, item))
    }

    /// Set a line's quantity; 0 removes the line.
    ///
    /// # Errors
    ///
    /// - [`CartError::NoCart`] if the identity has no cart
    /// - [`CartError::UnknownItem`] if the line is not in the cart
    #[instrument(skip(self, identity))]
    pub async fn set_quantity(
        &self,
        identity: &CartIdentity,
        item: CartItemId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let cart = self
            .resolver
            .resolve(identity)
            .await?
            .ok_or(CartError::NoCart)?;
        let result = if quantity == 0 {
            self.carts.remove_item(cart.id, item).await
        } else {
            self.carts.set_item_quantity(cart.id, item, quantity).await
        };
        match result {
            Ok(()) => Ok(cart),
            Err(StoreError::NotFound) => Err(CartError::UnknownItem(item)),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_quantity`].
    #[instrument(skip(self, identity))]
    pub async fn remove_item(
        &self,
        identity: &CartIdentity,
        item: CartItemId,
    ) -> Result<Cart, CartError> {
        let cart = self
            .resolver
            .resolve(identity)
            .await?
            .ok_or(CartError::NoCart)?;
        match self.carts.remove_item(cart.id, item).await {
            Ok(()) => Ok(cart),
            Err(StoreError::NotFound) => Err(CartError::UnknownItem(item)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::{MemoryCartStore, MemoryCatalog};

    fn service() -> CartService<MemoryCartStore, MemoryCatalog> {
        let catalog = MemoryCatalog::new();
        catalog.add_product(1, "Rope", 1500, 400);
        catalog.add_variant(1, 10, "30 m", Some(4200), Some(1200));
        CartService::new(MemoryCartStore::new(), catalog)
    }

    fn guest_identity(token: &GuestToken) -> CartIdentity {
        CartIdentity {
            user: None,
            guest: Some(token.clone()),
        }
    }

    #[tokio::test]
    async fn test_resolve_creates_nothing() {
        let service = service();
        let token = GuestToken::mint();
        let resolved = service
            .resolver()
            .resolve(&guest_identity(&token))
            .await
            .expect("resolve");
        assert!(resolved.is_none());
        // Resolving again still finds nothing: no cart was fabricated.
        assert!(
            service
                .resolver()
                .resolve(&guest_identity(&token))
                .await
                .expect("resolve")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_user_cart_wins_over_guest_cart() {
        let service = service();
        let token = GuestToken::mint();
        let user = UserId::new(5);

        let (guest_cart, _) = service
            .add_item(
                &guest_identity(&token),
                AddItem {
                    product: ProductId::new(1),
                    variant: None,
                    quantity: 1,
                },
            )
            .await
            .expect("guest add");
        let (user_cart, _) = service
            .add_item(
                &CartIdentity {
                    user: Some(user),
                    guest: None,
                },
                AddItem {
                    product: ProductId::new(1),
                    variant: None,
                    quantity: 2,
                },
            )
            .await
            .expect("user add");

        let both = CartIdentity {
            user: Some(user),
            guest: Some(token),
        };
        let resolved = service
            .resolver()
            .resolve(&both)
            .await
            .expect("resolve")
            .expect("cart");
        assert_eq!(resolved.id, user_cart.id);
        assert_ne!(resolved.id, guest_cart.id);
    }

    #[tokio::test]
    async fn test_add_same_line_increments_quantity() {
        let service = service();
        let token = GuestToken::mint();
        let identity = guest_identity(&token);
        let add = AddItem {
            product: ProductId::new(1),
            variant: Some(VariantId::new(10)),
            quantity: 2,
        };

        let (cart, first) = service.add_item(&identity, add).await.expect("add");
        let (_, second) = service.add_item(&identity, add).await.expect("add again");

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 4);
        let items = service.carts.items(cart.id).await.expect("items");
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_zero_quantity_before_any_write() {
        let service = service();
        let token = GuestToken::mint();
        let identity = guest_identity(&token);
        let err = service
            .add_item(
                &identity,
                AddItem {
                    product: ProductId::new(1),
                    variant: None,
                    quantity: 0,
                },
            )
            .await
            .expect_err("must reject");
        assert!(matches!(err, CartError::InvalidQuantity(0)));
        // No cart was created by the failed mutation.
        assert!(
            service
                .resolver()
                .resolve(&identity)
                .await
                .expect("resolve")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_rejected() {
        let service = service();
        let token = GuestToken::mint();
        let err = service
            .add_item(
                &guest_identity(&token),
                AddItem {
                    product: ProductId::new(99),
                    variant: None,
                    quantity: 1,
                },
            )
            .await
            .expect_err("must reject");
        assert!(matches!(err, CartError::UnknownProduct { .. }));
    }

    #[tokio::test]
    async fn test_set_quantity_zero_removes_line() {
        let service = service();
        let token = GuestToken::mint();
        let identity = guest_identity(&token);
        let (cart, item) = service
            .add_item(
                &identity,
                AddItem {
                    product: ProductId::new(1),
                    variant: None,
                    quantity: 3,
                },
            )
            .await
            .expect("add");

        service
            .set_quantity(&identity, item.id, 0)
            .await
            .expect("remove via zero");
        assert!(service.carts.items(cart.id).await.expect("items").is_empty());
    }

    #[tokio::test]
    async fn test_mutating_unknown_item_fails() {
        let service = service();
        let token = GuestToken::mint();
        let identity = guest_identity(&token);
        service
            .add_item(
                &identity,
                AddItem {
                    product: ProductId::new(1),
                    variant: None,
                    quantity: 1,
                },
            )
            .await
            .expect("add");

        let err = service
            .set_quantity(&identity, CartItemId::new(999), 2)
            .await
            .expect_err("unknown item");
        assert!(matches!(err, CartError::UnknownItem(_)));
    }
}
