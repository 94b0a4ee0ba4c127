//! Seed shipping configuration and demo catalog data from a YAML fixture.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use marram_core::CountryCode;

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    carriers: Vec<CarrierFixture>,
    #[serde(default)]
    zones: Vec<ZoneFixture>,
    #[serde(default)]
    products: Vec<ProductFixture>,
}

#[derive(Debug, Deserialize)]
struct CarrierFixture {
    name: String,
    #[serde(default)]
    uses_pickup_points: bool,
}

#[derive(Debug, Deserialize)]
struct ZoneFixture {
    name: String,
    #[serde(default)]
    countries: Vec<String>,
    #[serde(default)]
    display_order: i32,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    methods: Vec<MethodFixture>,
}

#[derive(Debug, Deserialize)]
struct MethodFixture {
    name: String,
    rate_type: String,
    carrier: Option<String>,
    flat_rate_cents: Option<i64>,
    free_threshold_cents: Option<i64>,
    #[serde(default)]
    display_order: i32,
    #[serde(default = "default_true")]
    is_active: bool,
    delivery_days_min: Option<i32>,
    delivery_days_max: Option<i32>,
    #[serde(default)]
    tiers: Vec<TierFixture>,
}

#[derive(Debug, Deserialize)]
struct TierFixture {
    lower_bound: i64,
    rate_cents: i64,
}

#[derive(Debug, Deserialize)]
struct ProductFixture {
    name: String,
    price_cents: i64,
    weight_grams: i64,
    #[serde(default)]
    variants: Vec<VariantFixture>,
}

#[derive(Debug, Deserialize)]
struct VariantFixture {
    name: String,
    price_cents: Option<i64>,
    weight_grams: Option<i64>,
}

const fn default_true() -> bool {
    true
}

/// Seed the database from a fixture file.
///
/// # Errors
///
/// Returns an error on unreadable fixtures, invalid YAML, or query failure.
pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
    let fixture: Fixture = serde_yaml::from_str(&raw)?;

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .map_err(|_| "STOREFRONT_DATABASE_URL is not set")?;
    let pool: PgPool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    let mut tx = pool.begin().await?;

    let carrier_ids = seed_carriers(&mut tx, &fixture.carriers).await?;
    seed_zones(&mut tx, &fixture.zones, &carrier_ids).await?;
    seed_products(&mut tx, &fixture.products).await?;

    tx.commit().await?;
    tracing::info!(
        carriers = fixture.carriers.len(),
        zones = fixture.zones.len(),
        products = fixture.products.len(),
        "Seed complete"
    );
    Ok(())
}

async fn seed_carriers(
    tx: &mut Transaction<'_, Postgres>,
    carriers: &[CarrierFixture],
) -> Result<HashMap<String, i32>, sqlx::Error> {
    let mut ids = HashMap::new();
    for carrier in carriers {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO storefront.shipping_carrier (name, uses_pickup_points)
             VALUES ($1, $2) RETURNING id",
        )
        .bind(&carrier.name)
        .bind(carrier.uses_pickup_points)
        .fetch_one(&mut **tx)
        .await?;
        ids.insert(carrier.name.clone(), id);
    }
    Ok(ids)
}

async fn seed_zones(
    tx: &mut Transaction<'_, Postgres>,
    zones: &[ZoneFixture],
    carrier_ids: &HashMap<String, i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    for zone in zones {
        let zone_id: i32 = sqlx::query_scalar(
            "INSERT INTO storefront.shipping_zone (name, is_active, display_order)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&zone.name)
        .bind(zone.is_active)
        .bind(zone.display_order)
        .fetch_one(&mut **tx)
        .await?;

        for country in &zone.countries {
            let code = CountryCode::parse(country)
                .map_err(|e| format!("zone {}: {e}", zone.name))?;
            sqlx::query(
                "INSERT INTO storefront.shipping_zone_country (zone_id, country)
                 VALUES ($1, $2)",
            )
            .bind(zone_id)
            .bind(code.as_str())
            .execute(&mut **tx)
            .await?;
        }

        for method in &zone.methods {
            let carrier_id = match &method.carrier {
                Some(name) => Some(
                    *carrier_ids
                        .get(name)
                        .ok_or_else(|| format!("method {} uses unknown carrier {name}", method.name))?,
                ),
                None => None,
            };
            let method_id: i32 = sqlx::query_scalar(
                "INSERT INTO storefront.shipping_method
                     (zone_id, carrier_id, name, rate_type, flat_rate_cents,
                      free_threshold_cents, is_active, display_order,
                      delivery_days_min, delivery_days_max)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
            )
            .bind(zone_id)
            .bind(carrier_id)
            .bind(&method.name)
            .bind(&method.rate_type)
            .bind(method.flat_rate_cents)
            .bind(method.free_threshold_cents)
            .bind(method.is_active)
            .bind(method.display_order)
            .bind(method.delivery_days_min)
            .bind(method.delivery_days_max)
            .fetch_one(&mut **tx)
            .await?;

            for tier in &method.tiers {
                sqlx::query(
                    "INSERT INTO storefront.shipping_method_tier
                         (method_id, lower_bound, rate_cents)
                     VALUES ($1, $2, $3)",
                )
                .bind(method_id)
                .bind(tier.lower_bound)
                .bind(tier.rate_cents)
                .execute(&mut **tx)
                .await?;
            }
        }
    }
    Ok(())
}

async fn seed_products(
    tx: &mut Transaction<'_, Postgres>,
    products: &[ProductFixture],
) -> Result<(), sqlx::Error> {
    for product in products {
        let product_id: i32 = sqlx::query_scalar(
            "INSERT INTO storefront.product (name, price_cents, weight_grams)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.weight_grams)
        .fetch_one(&mut **tx)
        .await?;

        for variant in &product.variants {
            sqlx::query(
                "INSERT INTO storefront.product_variant
                     (product_id, name, price_cents, weight_grams)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(product_id)
            .bind(&variant.name)
            .bind(variant.price_cents)
            .bind(variant.weight_grams)
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_parses() {
        let fixture: Fixture = serde_yaml::from_str(include_str!("../../fixtures/shipping.yaml"))
            .expect("fixture must parse");
        assert!(!fixture.zones.is_empty());
        assert!(
            fixture
                .zones
                .iter()
                .any(|z| z.countries.is_empty()),
            "fixture should include a wildcard zone"
        );
        let rate_types: Vec<&str> = fixture
            .zones
            .iter()
            .flat_map(|z| z.methods.iter().map(|m| m.rate_type.as_str()))
            .collect();
        for expected in ["flat", "free", "price_based", "weight_based"] {
            assert!(rate_types.contains(&expected), "missing {expected} method");
        }
    }
}
