//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{
    CachedZoneCatalog, PgAddressStore, PgCartStore, PgCatalogStore, PgOrderStore, PgShippingStore,
};
use crate::services::cart::CartService;
use crate::services::checkout::CheckoutAggregator;
use crate::services::merge::CartMergeEngine;
use crate::services::orders::OrderService;
use crate::services::shipping::ShippingRateEngine;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources like the database pool and the cached shipping catalog.
/// Services are constructed per call over pool-backed stores (the pool
/// itself is the shared handle).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    zones: CachedZoneCatalog<PgShippingStore>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let zones = CachedZoneCatalog::new(
            PgShippingStore::new(pool.clone()),
            config.shipping_cache_ttl,
        );
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                zones,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Cart resolution and mutations.
    #[must_use]
    pub fn cart_service(&self) -> CartService<PgCartStore, PgCatalogStore> {
        CartService::new(
            PgCartStore::new(self.inner.pool.clone()),
            PgCatalogStore::new(self.inner.pool.clone()),
        )
    }

    /// Checkout aggregation.
    #[must_use]
    pub fn aggregator(&self) -> CheckoutAggregator<PgCartStore, PgCatalogStore> {
        CheckoutAggregator::new(
            PgCartStore::new(self.inner.pool.clone()),
            PgCatalogStore::new(self.inner.pool.clone()),
        )
    }

    /// Shipping rates over the cached zone catalog.
    #[must_use]
    pub fn rate_engine(&self) -> ShippingRateEngine<CachedZoneCatalog<PgShippingStore>> {
        ShippingRateEngine::new(self.inner.zones.clone())
    }

    /// Guest→user cart merge.
    #[must_use]
    pub fn merge_engine(&self) -> CartMergeEngine<PgCartStore> {
        CartMergeEngine::new(PgCartStore::new(self.inner.pool.clone()))
    }

    /// Order numbering and placement.
    #[must_use]
    pub fn order_service(&self) -> OrderService<PgOrderStore, PgCartStore> {
        OrderService::new(
            PgOrderStore::new(self.inner.pool.clone()),
            PgCartStore::new(self.inner.pool.clone()),
            self.inner.config.order_number_prefix.clone(),
        )
    }

    /// User address book.
    #[must_use]
    pub fn addresses(&self) -> PgAddressStore {
        PgAddressStore::new(self.inner.pool.clone())
    }
}
