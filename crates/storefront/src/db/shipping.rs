//! Shipping configuration reads.
//!
//! Zones change rarely and are read on every checkout page, so the zone
//! catalog is wrapped in a short-TTL moka cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::prelude::FromRow;

use marram_core::{CarrierId, CountryCode, MethodId, Money, Weight, ZoneId};

use super::StoreError;
use crate::models::shipping::{
    Carrier, PriceTier, RatePolicy, ShippingMethod, ShippingZone, WeightTier, ZoneWithMethods,
};
use crate::services::shipping::ZoneCatalog;

#[derive(FromRow)]
struct ZoneRow {
    id: i32,
    name: String,
    is_active: bool,
    display_order: i32,
}

#[derive(FromRow)]
struct ZoneCountryRow {
    zone_id: i32,
    country: String,
}

#[derive(FromRow)]
struct MethodRow {
    id: i32,
    zone_id: i32,
    carrier_id: Option<i32>,
    name: String,
    rate_type: String,
    flat_rate_cents: Option<i64>,
    free_threshold_cents: Option<i64>,
    is_active: bool,
    display_order: i32,
    delivery_days_min: Option<i32>,
    delivery_days_max: Option<i32>,
}

#[derive(FromRow)]
struct TierRow {
    method_id: i32,
    lower_bound: i64,
    rate_cents: i64,
}

#[derive(FromRow)]
struct CarrierRow {
    id: i32,
    name: String,
    uses_pickup_points: bool,
}

/// `PostgreSQL`-backed shipping configuration store.
#[derive(Clone)]
pub struct PgShippingStore {
    pool: PgPool,
}

impl PgShippingStore {
    /// Create a shipping store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ZoneCatalog for PgShippingStore {
    async fn zones_with_methods(&self) -> Result<Arc<Vec<ZoneWithMethods>>, StoreError> {
        let zones: Vec<ZoneRow> = sqlx::query_as(
            "SELECT id, name, is_active, display_order
             FROM storefront.shipping_zone ORDER BY display_order, id",
        )
        .fetch_all(&self.pool)
        .await?;
        let countries: Vec<ZoneCountryRow> =
            sqlx::query_as("SELECT zone_id, country FROM storefront.shipping_zone_country")
                .fetch_all(&self.pool)
                .await?;
        let methods: Vec<MethodRow> = sqlx::query_as(
            "SELECT id, zone_id, carrier_id, name, rate_type, flat_rate_cents,
                    free_threshold_cents, is_active, display_order,
                    delivery_days_min, delivery_days_max
             FROM storefront.shipping_method ORDER BY zone_id, display_order, name",
        )
        .fetch_all(&self.pool)
        .await?;
        let tiers: Vec<TierRow> = sqlx::query_as(
            "SELECT method_id, lower_bound, rate_cents
             FROM storefront.shipping_method_tier ORDER BY method_id, lower_bound",
        )
        .fetch_all(&self.pool)
        .await?;
        let carriers: Vec<CarrierRow> =
            sqlx::query_as("SELECT id, name, uses_pickup_points FROM storefront.shipping_carrier")
                .fetch_all(&self.pool)
                .await?;

        Ok(Arc::new(assemble(zones, countries, methods, tiers, &carriers)?))
    }
}

fn assemble(
    zones: Vec<ZoneRow>,
    countries: Vec<ZoneCountryRow>,
    methods: Vec<MethodRow>,
    tiers: Vec<TierRow>,
    carriers: &[CarrierRow],
) -> Result<Vec<ZoneWithMethods>, StoreError> {
    let mut countries_by_zone: HashMap<i32, Vec<CountryCode>> = HashMap::new();
    for row in countries {
        let code = CountryCode::parse(&row.country).map_err(|e| {
            StoreError::DataCorruption(format!("zone {} country: {e}", row.zone_id))
        })?;
        countries_by_zone.entry(row.zone_id).or_default().push(code);
    }

    let mut tiers_by_method: HashMap<i32, Vec<TierRow>> = HashMap::new();
    for row in tiers {
        tiers_by_method.entry(row.method_id).or_default().push(row);
    }

    let mut methods_by_zone: HashMap<i32, Vec<ShippingMethod>> = HashMap::new();
    for row in methods {
        let method_tiers = tiers_by_method.remove(&row.id).unwrap_or_default();
        let method = to_method(row, method_tiers)?;
        methods_by_zone
            .entry(method.zone_id.as_i32())
            .or_default()
            .push(method);
    }

    zones
        .into_iter()
        .map(|zone_row| {
            let methods = methods_by_zone.remove(&zone_row.id).unwrap_or_default();
            let zone_carriers = carriers
                .iter()
                .filter(|c| {
                    methods
                        .iter()
                        .any(|m| m.carrier_id == Some(CarrierId::new(c.id)))
                })
                .map(|c| Carrier {
                    id: CarrierId::new(c.id),
                    name: c.name.clone(),
                    uses_pickup_points: c.uses_pickup_points,
                })
                .collect();
            Ok(ZoneWithMethods {
                zone: ShippingZone {
                    id: ZoneId::new(zone_row.id),
                    name: zone_row.name,
                    countries: countries_by_zone.remove(&zone_row.id).unwrap_or_default(),
                    is_active: zone_row.is_active,
                    display_order: zone_row.display_order,
                },
                methods,
                carriers: zone_carriers,
            })
        })
        .collect()
}

fn to_method(row: MethodRow, tiers: Vec<TierRow>) -> Result<ShippingMethod, StoreError> {
    let policy = match row.rate_type.as_str() {
        "flat" => RatePolicy::Flat {
            rate: Money::from_cents(row.flat_rate_cents.ok_or_else(|| {
                StoreError::DataCorruption(format!("flat method {} has no rate", row.id))
            })?),
        },
        "free" => RatePolicy::Free {
            threshold: row.free_threshold_cents.map(Money::from_cents),
        },
        "price_based" => RatePolicy::PriceBased {
            tiers: tiers
                .iter()
                .map(|t| PriceTier {
                    lower_bound: Money::from_cents(t.lower_bound),
                    rate: Money::from_cents(t.rate_cents),
                })
                .collect(),
        },
        "weight_based" => RatePolicy::WeightBased {
            tiers: tiers
                .iter()
                .map(|t| WeightTier {
                    lower_bound: Weight::from_grams(t.lower_bound),
                    rate: Money::from_cents(t.rate_cents),
                })
                .collect(),
        },
        other => {
            return Err(StoreError::DataCorruption(format!(
                "method {} has unknown rate type {other:?}",
                row.id
            )));
        }
    };

    let delivery_days = match (row.delivery_days_min, row.delivery_days_max) {
        (Some(min), Some(max)) => u8::try_from(min).ok().zip(u8::try_from(max).ok()),
        _ => None,
    };

    Ok(ShippingMethod {
        id: MethodId::new(row.id),
        zone_id: ZoneId::new(row.zone_id),
        carrier_id: row.carrier_id.map(CarrierId::new),
        name: row.name,
        policy,
        is_active: row.is_active,
        display_order: row.display_order,
        delivery_days,
    })
}

/// A [`ZoneCatalog`] that caches the assembled zone list for a short TTL.
#[derive(Clone)]
pub struct CachedZoneCatalog<S> {
    store: S,
    cache: moka::future::Cache<(), Arc<Vec<ZoneWithMethods>>>,
}

impl<S> CachedZoneCatalog<S> {
    /// Wrap a store with a TTL cache.
    #[must_use]
    pub fn new(store: S, ttl: Duration) -> Self {
        Self {
            store,
            cache: moka::future::Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build(),
        }
    }
}

impl<S: ZoneCatalog + Sync> ZoneCatalog for CachedZoneCatalog<S> {
    async fn zones_with_methods(&self) -> Result<Arc<Vec<ZoneWithMethods>>, StoreError> {
        if let Some(zones) = self.cache.get(&()).await {
            return Ok(zones);
        }
        let zones = self.store.zones_with_methods().await?;
        self.cache.insert((), Arc::clone(&zones)).await;
        Ok(zones)
    }
}
