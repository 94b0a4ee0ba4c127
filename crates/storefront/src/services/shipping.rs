//! Shipping rate resolution for a destination country.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use marram_core::{CarrierId, CountryCode, CountryCodeError, MethodId, Money, ZoneId};

use crate::db::StoreError;
use crate::models::shipping::{RatePolicy, ShippingMethod, ZoneWithMethods};
use crate::services::checkout::CartTotals;

/// Read access to the shipping configuration.
#[allow(async_fn_in_trait)]
pub trait ZoneCatalog {
    /// Every configured zone with its methods and carriers.
    ///
    /// Filtering by activity and destination is the engine's job; the
    /// catalog only loads.
    async fn zones_with_methods(&self) -> Result<Arc<Vec<ZoneWithMethods>>, StoreError>;
}

/// Errors from rate resolution.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// The destination country is not a valid two-letter code. This is a
    /// rejected input, not an empty result.
    #[error("invalid destination country: {0}")]
    InvalidCountry(#[from] CountryCodeError),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One offered shipping method with its computed cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuote {
    /// The method.
    pub method_id: MethodId,
    /// Method display name.
    pub name: String,
    /// Zone the method came from.
    pub zone_id: ZoneId,
    /// Fulfilling carrier, if assigned.
    pub carrier_id: Option<CarrierId>,
    /// Whether shipments for this method are addressed to pickup points.
    pub requires_pickup_point: bool,
    /// Computed cost for this cart (or the context-free cost).
    pub cost: Money,
    /// Estimated delivery window in days.
    pub delivery_days: Option<(u8, u8)>,
    /// Listing position.
    pub display_order: i32,
}

/// Resolves applicable zones for a destination and computes a cost per
/// method.
#[derive(Debug, Clone)]
pub struct ShippingRateEngine<Z> {
    zones: Z,
}

impl<Z: ZoneCatalog> ShippingRateEngine<Z> {
    /// Create an engine over a zone catalog.
    pub const fn new(zones: Z) -> Self {
        Self { zones }
    }

    /// The ordered candidate methods for a destination.
    ///
    /// `country` is normalized to uppercase and must be exactly two letters.
    /// Zones are not mutually exclusive: every active zone whose country set
    /// is empty (wildcard) or contains the destination contributes its
    /// active methods. Methods whose policy needs cart context are omitted
    /// when `totals` is `None`; [`RatePolicy::required_context`] declares
    /// the need so callers can supply totals or accept the shorter listing.
    ///
    /// Results are ordered by (display order, name) and deduplicated by
    /// method id.
    ///
    /// # Errors
    ///
    /// - [`ShippingError::InvalidCountry`] for malformed input
    #[instrument(skip(self, totals))]
    pub async fn quote(
        &self,
        country: &str,
        totals: Option<&CartTotals>,
    ) -> Result<Vec<RateQuote>, ShippingError> {
        let destination = CountryCode::parse(country)?;
        let zones = self.zones.zones_with_methods().await?;

        let mut seen = HashSet::new();
        let mut quotes = Vec::new();
        for entry in zones
            .iter()
            .filter(|z| z.zone.is_active && z.zone.matches(destination))
        {
            for method in entry.methods.iter().filter(|m| m.is_active) {
                if !seen.insert(method.id) {
                    continue;
                }
                let Some(cost) = policy_cost(&method.policy, totals) else {
                    tracing::debug!(
                        method = %method.id,
                        kind = method.policy.kind(),
                        "method omitted: not offered for this cart"
                    );
                    continue;
                };
                quotes.push(to_quote(entry, method, cost));
            }
        }

        quotes.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(quotes)
    }
}

/// The cost of a policy for the given cart context, or `None` when the
/// method is not offered (below a free threshold, below every tier, or
/// requiring context that was not supplied).
fn policy_cost(policy: &RatePolicy, totals: Option<&CartTotals>) -> Option<Money> {
    match policy {
        RatePolicy::Flat { rate } => Some(*rate),
        RatePolicy::Free { threshold: None } => Some(Money::ZERO),
        RatePolicy::Free {
            threshold: Some(threshold),
        } => (totals?.subtotal >= *threshold).then_some(Money::ZERO),
        RatePolicy::PriceBased { tiers } => {
            let subtotal = totals?.subtotal;
            tiers
                .iter()
                .rev()
                .find(|tier| tier.lower_bound <= subtotal)
                .map(|tier| tier.rate)
        }
        RatePolicy::WeightBased { tiers } => {
            let weight = totals?.total_weight;
            tiers
                .iter()
                .rev()
                .find(|tier| tier.lower_bound <= weight)
                .map(|tier| tier.rate)
        }
    }
}

fn to_quote(entry: &ZoneWithMethods, method: &ShippingMethod, cost: Money) -> RateQuote {
    let requires_pickup_point = method
        .carrier_id
        .and_then(|id| entry.carrier(id))
        .is_some_and(|carrier| carrier.uses_pickup_points);
    RateQuote {
        method_id: method.id,
        name: method.name.clone(),
        zone_id: method.zone_id,
        carrier_id: method.carrier_id,
        requires_pickup_point,
        cost,
        delivery_days: method.delivery_days,
        display_order: method.display_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marram_core::Weight;

    use crate::models::shipping::{PriceTier, WeightTier};
    use crate::services::fakes::{MemoryZoneCatalog, ZoneSpec};

    fn totals(subtotal: i64, weight: i64) -> CartTotals {
        CartTotals {
            subtotal: Money::from_cents(subtotal),
            total_weight: Weight::from_grams(weight),
        }
    }

    fn engine(zones: Vec<ZoneSpec>) -> ShippingRateEngine<MemoryZoneCatalog> {
        ShippingRateEngine::new(MemoryZoneCatalog::build(zones))
    }

    #[test]
    fn test_flat_needs_no_context() {
        let policy = RatePolicy::Flat {
            rate: Money::from_cents(599),
        };
        assert_eq!(policy_cost(&policy, None), Some(Money::from_cents(599)));
        assert!(policy.required_context().is_none());
    }

    #[test]
    fn test_free_threshold_is_inclusive() {
        let policy = RatePolicy::Free {
            threshold: Some(Money::from_cents(5000)),
        };
        assert_eq!(
            policy_cost(&policy, Some(&totals(5000, 0))),
            Some(Money::ZERO)
        );
        assert_eq!(policy_cost(&policy, Some(&totals(4999, 0))), None);
        // No cart context: the method cannot be offered.
        assert_eq!(policy_cost(&policy, None), None);
    }

    #[test]
    fn test_free_without_threshold_is_always_free() {
        let policy = RatePolicy::Free { threshold: None };
        assert_eq!(policy_cost(&policy, None), Some(Money::ZERO));
        assert!(policy.required_context().is_none());
    }

    #[test]
    fn test_weight_tiers_pick_highest_matching_bound() {
        let policy = RatePolicy::WeightBased {
            tiers: vec![
                WeightTier {
                    lower_bound: Weight::from_grams(0),
                    rate: Money::from_cents(500),
                },
                WeightTier {
                    lower_bound: Weight::from_grams(1000),
                    rate: Money::from_cents(800),
                },
            ],
        };
        assert_eq!(
            policy_cost(&policy, Some(&totals(0, 1200))),
            Some(Money::from_cents(800))
        );
        assert_eq!(
            policy_cost(&policy, Some(&totals(0, 999))),
            Some(Money::from_cents(500))
        );
        // Boundary is lower-bound-inclusive.
        assert_eq!(
            policy_cost(&policy, Some(&totals(0, 1000))),
            Some(Money::from_cents(800))
        );
    }

    #[test]
    fn test_price_tiers_below_every_bound_not_offered() {
        let policy = RatePolicy::PriceBased {
            tiers: vec![PriceTier {
                lower_bound: Money::from_cents(2000),
                rate: Money::from_cents(300),
            }],
        };
        assert_eq!(policy_cost(&policy, Some(&totals(1999, 0))), None);
        assert_eq!(
            policy_cost(&policy, Some(&totals(2000, 0))),
            Some(Money::from_cents(300))
        );
    }

    #[tokio::test]
    async fn test_specific_and_wildcard_zones_both_match() {
        let engine = engine(vec![
            ZoneSpec::new(1, "France", &["FR"]).method(10, "Colis", 1, flat(700)),
            ZoneSpec::new(2, "Everywhere", &[]).method(20, "Worldwide", 2, flat(2500)),
        ]);

        let quotes = engine.quote("fr", None).await.expect("quote");
        let ids: Vec<i32> = quotes.iter().map(|q| q.method_id.as_i32()).collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[tokio::test]
    async fn test_unmatched_country_is_empty_not_an_error() {
        let engine = engine(vec![
            ZoneSpec::new(1, "France", &["FR"]).method(10, "Colis", 1, flat(700)),
        ]);
        let quotes = engine.quote("US", None).await.expect("quote");
        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_country_is_rejected() {
        let engine = engine(vec![]);
        assert!(matches!(
            engine.quote("FRA", None).await,
            Err(ShippingError::InvalidCountry(_))
        ));
        assert!(matches!(
            engine.quote("", None).await,
            Err(ShippingError::InvalidCountry(_))
        ));
    }

    #[tokio::test]
    async fn test_inactive_zones_and_methods_are_excluded() {
        let engine = engine(vec![
            ZoneSpec::new(1, "France", &["FR"])
                .inactive()
                .method(10, "Hidden", 1, flat(100)),
            ZoneSpec::new(2, "Everywhere", &[])
                .method(20, "Active", 1, flat(200))
                .inactive_method(21, "Disabled", 2, flat(300)),
        ]);

        let quotes = engine.quote("FR", None).await.expect("quote");
        let ids: Vec<i32> = quotes.iter().map(|q| q.method_id.as_i32()).collect();
        assert_eq!(ids, vec![20]);
    }

    #[tokio::test]
    async fn test_ordering_by_display_order_then_name() {
        let engine = engine(vec![
            ZoneSpec::new(1, "Everywhere", &[])
                .method(10, "Beta", 2, flat(100))
                .method(11, "Alpha", 2, flat(100))
                .method(12, "Zulu", 1, flat(100)),
        ]);

        let quotes = engine.quote("NL", None).await.expect("quote");
        let names: Vec<&str> = quotes.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["Zulu", "Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn test_context_methods_omitted_without_cart() {
        let engine = engine(vec![
            ZoneSpec::new(1, "Everywhere", &[])
                .method(10, "Flat", 1, flat(700))
                .method(
                    11,
                    "Free over 50",
                    2,
                    RatePolicy::Free {
                        threshold: Some(Money::from_cents(5000)),
                    },
                ),
        ]);

        let without = engine.quote("DE", None).await.expect("quote");
        assert_eq!(without.len(), 1);

        let with = engine
            .quote("DE", Some(&totals(6000, 500)))
            .await
            .expect("quote");
        assert_eq!(with.len(), 2);
    }

    #[tokio::test]
    async fn test_pickup_point_carriers_are_flagged() {
        use crate::models::shipping::Carrier;

        let engine = engine(vec![
            ZoneSpec::new(1, "Everywhere", &[])
                .method(10, "Home delivery", 1, flat(700))
                .method_via(
                    11,
                    "Parcel locker",
                    2,
                    flat(500),
                    Carrier {
                        id: CarrierId::new(3),
                        name: "BoxPost".to_owned(),
                        uses_pickup_points: true,
                    },
                ),
        ]);

        let quotes = engine.quote("NL", None).await.expect("quote");
        let flags: Vec<bool> = quotes.iter().map(|q| q.requires_pickup_point).collect();
        assert_eq!(flags, vec![false, true]);
    }

    fn flat(cents: i64) -> RatePolicy {
        RatePolicy::Flat {
            rate: Money::from_cents(cents),
        }
    }
}
