//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::carrier::CarrierClient;
use crate::config::AdminConfig;
use crate::db::PgShipmentStore;
use crate::services::labels::ShipmentLabelManager;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    carrier: CarrierClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let carrier = CarrierClient::new(&config.carrier);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carrier,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Shipment booking and label retrieval.
    #[must_use]
    pub fn label_manager(&self) -> ShipmentLabelManager<PgShipmentStore, CarrierClient> {
        ShipmentLabelManager::new(
            PgShipmentStore::new(self.inner.pool.clone()),
            self.inner.carrier.clone(),
            self.inner.config.store_address.clone(),
        )
    }
}
