//! In-memory store fakes for component tests.
//!
//! Each fake keeps its state behind a single mutex, which also gives the
//! merge and insert operations the atomicity the real stores provide with
//! transactions. Failure-injection hooks simulate serialization conflicts
//! and unique violations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use marram_core::{
    CarrierId, CartId, CartItemId, CountryCode, GuestToken, MethodId, Money, OrderId, OrderStatus,
    ProductId, UserId, VariantId, Weight, ZoneId,
};

use crate::db::StoreError;
use crate::models::cart::{Cart, CartItem, CartOwner, MergeOutcome};
use crate::models::catalog::{LineSnapshot, ProductSnapshot, VariantSnapshot};
use crate::models::order::{NewOrder, Order};
use crate::models::shipping::{
    Carrier, RatePolicy, ShippingMethod, ShippingZone, ZoneWithMethods,
};
use crate::services::cart::CartStore;
use crate::services::checkout::CatalogStore;
use crate::services::orders::OrderStore;
use crate::services::shipping::ZoneCatalog;

// =============================================================================
// Carts
// =============================================================================

#[derive(Default)]
struct CartsInner {
    carts: Vec<Cart>,
    items: Vec<CartItem>,
    next_cart: i32,
    next_item: i32,
    fail_deletes: bool,
    fail_merges_remaining: u32,
    merge_attempts: u32,
}

/// In-memory [`CartStore`].
#[derive(Clone, Default)]
pub struct MemoryCartStore {
    inner: Arc<Mutex<CartsInner>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `delete_cart` call fail until cleared.
    pub fn fail_deletes(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }

    /// Make the next `n` merge calls fail with a serialization conflict.
    pub fn fail_merges(&self, n: u32) {
        self.lock().fail_merges_remaining = n;
    }

    /// How many merge attempts the store has seen.
    #[must_use]
    pub fn merge_attempts(&self) -> u32 {
        self.lock().merge_attempts
    }

    fn lock(&self) -> MutexGuard<'_, CartsInner> {
        self.inner.lock().expect("cart store lock poisoned")
    }
}

impl CartStore for MemoryCartStore {
    async fn find_by_user(&self, user: UserId) -> Result<Option<Cart>, StoreError> {
        Ok(self
            .lock()
            .carts
            .iter()
            .find(|c| c.owner == CartOwner::User(user))
            .cloned())
    }

    async fn find_by_token(&self, token: &GuestToken) -> Result<Option<Cart>, StoreError> {
        Ok(self
            .lock()
            .carts
            .iter()
            .find(|c| c.owner == CartOwner::Guest(token.clone()))
            .cloned())
    }

    async fn create(&self, owner: &CartOwner) -> Result<Cart, StoreError> {
        let mut inner = self.lock();
        if inner.carts.iter().any(|c| &c.owner == owner) {
            return Err(StoreError::Conflict("cart already exists".to_owned()));
        }
        inner.next_cart += 1;
        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(inner.next_cart),
            owner: owner.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.carts.push(cart.clone());
        Ok(cart)
    }

    async fn items(&self, cart: CartId) -> Result<Vec<CartItem>, StoreError> {
        Ok(self
            .lock()
            .items
            .iter()
            .filter(|i| i.cart_id == cart)
            .cloned()
            .collect())
    }

    async fn upsert_item(
        &self,
        cart: CartId,
        product: ProductId,
        variant: Option<VariantId>,
        quantity: u32,
    ) -> Result<CartItem, StoreError> {
        let mut inner = self.lock();
        if let Some(existing) = inner
            .items
            .iter_mut()
            .find(|i| i.cart_id == cart && i.line_key() == (product, variant))
        {
            existing.quantity += quantity;
            return Ok(existing.clone());
        }
        inner.next_item += 1;
        let item = CartItem {
            id: CartItemId::new(inner.next_item),
            cart_id: cart,
            product_id: product,
            variant_id: variant,
            quantity,
        };
        inner.items.push(item.clone());
        Ok(item)
    }

    async fn set_item_quantity(
        &self,
        cart: CartId,
        item: CartItemId,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        match inner
            .items
            .iter_mut()
            .find(|i| i.cart_id == cart && i.id == item)
        {
            Some(existing) => {
                existing.quantity = quantity;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn remove_item(&self, cart: CartId, item: CartItemId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let before = inner.items.len();
        inner.items.retain(|i| !(i.cart_id == cart && i.id == item));
        if inner.items.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_cart(&self, cart: CartId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_deletes {
            return Err(StoreError::Conflict("injected delete failure".to_owned()));
        }
        inner.carts.retain(|c| c.id != cart);
        inner.items.retain(|i| i.cart_id != cart);
        Ok(())
    }

    async fn merge_guest_cart(
        &self,
        token: &GuestToken,
        user: UserId,
    ) -> Result<MergeOutcome, StoreError> {
        let mut inner = self.lock();
        inner.merge_attempts += 1;
        if inner.fail_merges_remaining > 0 {
            inner.fail_merges_remaining -= 1;
            return Err(StoreError::Conflict(
                "injected serialization failure".to_owned(),
            ));
        }

        let Some(guest_id) = inner
            .carts
            .iter()
            .find(|c| c.owner == CartOwner::Guest(token.clone()))
            .map(|c| c.id)
        else {
            return Ok(MergeOutcome::NoGuestCart);
        };
        let user_id = inner
            .carts
            .iter()
            .find(|c| c.owner == CartOwner::User(user))
            .map(|c| c.id);

        match user_id {
            None => {
                if let Some(cart) = inner.carts.iter_mut().find(|c| c.id == guest_id) {
                    cart.owner = CartOwner::User(user);
                    cart.updated_at = Utc::now();
                }
                Ok(MergeOutcome::Reassigned { cart: guest_id })
            }
            Some(into) => {
                let guest_items: Vec<CartItem> = inner
                    .items
                    .iter()
                    .filter(|i| i.cart_id == guest_id)
                    .cloned()
                    .collect();
                let mut lines_moved = 0;
                let mut lines_combined = 0;
                for guest_item in guest_items {
                    let existing = inner
                        .items
                        .iter_mut()
                        .find(|i| i.cart_id == into && i.line_key() == guest_item.line_key());
                    match existing {
                        Some(line) => {
                            line.quantity += guest_item.quantity;
                            lines_combined += 1;
                        }
                        None => {
                            if let Some(line) =
                                inner.items.iter_mut().find(|i| i.id == guest_item.id)
                            {
                                line.cart_id = into;
                            }
                            lines_moved += 1;
                        }
                    }
                }
                inner.carts.retain(|c| c.id != guest_id);
                inner.items.retain(|i| i.cart_id != guest_id);
                Ok(MergeOutcome::Merged {
                    into,
                    lines_moved,
                    lines_combined,
                })
            }
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Default)]
struct CatalogInner {
    products: HashMap<i32, ProductSnapshot>,
    variants: HashMap<i32, VariantSnapshot>,
}

/// In-memory [`CatalogStore`].
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    inner: Arc<Mutex<CatalogInner>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product with a base price (cents) and weight (grams).
    pub fn add_product(&self, id: i32, name: &str, price_cents: i64, weight_grams: i64) {
        self.lock().products.insert(
            id,
            ProductSnapshot {
                id: ProductId::new(id),
                name: name.to_owned(),
                price: Money::from_cents(price_cents),
                weight: Weight::from_grams(weight_grams),
            },
        );
    }

    /// Add a variant with optional per-field overrides.
    pub fn add_variant(
        &self,
        product_id: i32,
        id: i32,
        name: &str,
        price_cents: Option<i64>,
        weight_grams: Option<i64>,
    ) {
        self.lock().variants.insert(
            id,
            VariantSnapshot {
                id: VariantId::new(id),
                product_id: ProductId::new(product_id),
                name: name.to_owned(),
                price: price_cents.map(Money::from_cents),
                weight: weight_grams.map(Weight::from_grams),
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, CatalogInner> {
        self.inner.lock().expect("catalog lock poisoned")
    }
}

impl CatalogStore for MemoryCatalog {
    async fn line_snapshot(
        &self,
        product: ProductId,
        variant: Option<VariantId>,
    ) -> Result<Option<LineSnapshot>, StoreError> {
        let inner = self.lock();
        let Some(product) = inner.products.get(&product.as_i32()).cloned() else {
            return Ok(None);
        };
        let variant = match variant {
            None => None,
            Some(id) => match inner.variants.get(&id.as_i32()) {
                Some(v) if v.product_id == product.id => Some(v.clone()),
                _ => return Ok(None),
            },
        };
        Ok(Some(LineSnapshot { product, variant }))
    }
}

// =============================================================================
// Shipping zones
// =============================================================================

/// Builder for a test zone.
pub struct ZoneSpec {
    zone: ShippingZone,
    methods: Vec<ShippingMethod>,
    carriers: Vec<Carrier>,
}

impl ZoneSpec {
    /// A new active zone matching the given countries (empty = wildcard).
    #[must_use]
    pub fn new(id: i32, name: &str, countries: &[&str]) -> Self {
        Self {
            zone: ShippingZone {
                id: ZoneId::new(id),
                name: name.to_owned(),
                countries: countries
                    .iter()
                    .map(|c| CountryCode::parse(c).expect("test country"))
                    .collect(),
                is_active: true,
                display_order: id,
            },
            methods: Vec::new(),
            carriers: Vec::new(),
        }
    }

    /// Mark the zone inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.zone.is_active = false;
        self
    }

    /// Add an active method.
    #[must_use]
    pub fn method(self, id: i32, name: &str, display_order: i32, policy: RatePolicy) -> Self {
        self.push_method(id, name, display_order, policy, true, None)
    }

    /// Add an inactive method.
    #[must_use]
    pub fn inactive_method(
        self,
        id: i32,
        name: &str,
        display_order: i32,
        policy: RatePolicy,
    ) -> Self {
        self.push_method(id, name, display_order, policy, false, None)
    }

    /// Add an active method fulfilled by a carrier.
    #[must_use]
    pub fn method_via(
        mut self,
        id: i32,
        name: &str,
        display_order: i32,
        policy: RatePolicy,
        carrier: Carrier,
    ) -> Self {
        let carrier_id = carrier.id;
        self.carriers.push(carrier);
        self.push_method(id, name, display_order, policy, true, Some(carrier_id))
    }

    fn push_method(
        mut self,
        id: i32,
        name: &str,
        display_order: i32,
        policy: RatePolicy,
        is_active: bool,
        carrier_id: Option<CarrierId>,
    ) -> Self {
        self.methods.push(ShippingMethod {
            id: MethodId::new(id),
            zone_id: self.zone.id,
            carrier_id,
            name: name.to_owned(),
            policy,
            is_active,
            display_order,
            delivery_days: None,
        });
        self
    }
}

/// In-memory [`ZoneCatalog`].
#[derive(Clone)]
pub struct MemoryZoneCatalog {
    zones: Arc<Vec<ZoneWithMethods>>,
}

impl MemoryZoneCatalog {
    /// Assemble a catalog from zone specs.
    #[must_use]
    pub fn build(specs: Vec<ZoneSpec>) -> Self {
        Self {
            zones: Arc::new(
                specs
                    .into_iter()
                    .map(|spec| ZoneWithMethods {
                        zone: spec.zone,
                        methods: spec.methods,
                        carriers: spec.carriers,
                    })
                    .collect(),
            ),
        }
    }
}

impl ZoneCatalog for MemoryZoneCatalog {
    async fn zones_with_methods(&self) -> Result<Arc<Vec<ZoneWithMethods>>, StoreError> {
        Ok(Arc::clone(&self.zones))
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Default)]
struct OrdersInner {
    orders: Vec<Order>,
    next_id: i32,
    fail_inserts_remaining: u32,
}

/// In-memory [`OrderStore`].
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    inner: Arc<Mutex<OrdersInner>>,
}

impl MemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` inserts fail with a uniqueness conflict.
    pub fn fail_inserts(&self, n: u32) {
        self.lock().fail_inserts_remaining = n;
    }

    /// Number of persisted orders.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().orders.len()
    }

    fn lock(&self) -> MutexGuard<'_, OrdersInner> {
        self.inner.lock().expect("order store lock poisoned")
    }
}

impl OrderStore for MemoryOrderStore {
    async fn highest_sequence(&self) -> Result<Option<u32>, StoreError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .filter_map(|o| o.number.sequence())
            .max())
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let mut inner = self.lock();
        if inner.fail_inserts_remaining > 0 {
            inner.fail_inserts_remaining = inner.fail_inserts_remaining.saturating_sub(1);
            return Err(StoreError::Conflict(
                "injected order number conflict".to_owned(),
            ));
        }
        if inner.orders.iter().any(|o| o.number == order.number) {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.number
            )));
        }
        inner.next_id += 1;
        let persisted = Order {
            id: OrderId::new(inner.next_id),
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
            created_at: Utc::now(),
        };
        inner.orders.push(persisted.clone());
        Ok(persisted)
    }
}
