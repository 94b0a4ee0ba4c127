//! Shipping zones, methods, and rate policies.

use marram_core::{CarrierId, CountryCode, MethodId, Money, Weight, ZoneId};

/// A named set of destination countries that scopes shipping methods.
///
/// An empty country set is a wildcard matching every destination. Zones are
/// not mutually exclusive: a country-specific zone and a continental zone
/// can both match the same destination, and the methods of every match are
/// candidates.
#[derive(Debug, Clone)]
pub struct ShippingZone {
    /// Zone ID.
    pub id: ZoneId,
    /// Display name (e.g. "France", "Rest of Europe").
    pub name: String,
    /// Matched countries; empty means "every country".
    pub countries: Vec<CountryCode>,
    /// Inactive zones contribute no candidate methods.
    pub is_active: bool,
    /// Position in admin listings.
    pub display_order: i32,
}

impl ShippingZone {
    /// Whether this zone covers the destination country.
    #[must_use]
    pub fn matches(&self, country: CountryCode) -> bool {
        self.countries.is_empty() || self.countries.contains(&country)
    }
}

/// An external shipping provider.
#[derive(Debug, Clone)]
pub struct Carrier {
    /// Carrier ID.
    pub id: CarrierId,
    /// Display name.
    pub name: String,
    /// Whether shipments with this carrier are addressed to pickup points.
    pub uses_pickup_points: bool,
}

/// A price tier keyed on cart subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceTier {
    /// Inclusive lower bound on the subtotal.
    pub lower_bound: Money,
    /// The shipping cost for this tier.
    pub rate: Money,
}

/// A price tier keyed on cart weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightTier {
    /// Inclusive lower bound on the total weight.
    pub lower_bound: Weight,
    /// The shipping cost for this tier.
    pub rate: Money,
}

/// The cart context a rate policy needs to produce a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateContext {
    /// The cart subtotal.
    Subtotal,
    /// The cart's total weight.
    Weight,
}

/// How a method's cost is computed.
///
/// Tiers are kept sorted ascending by lower bound; selection is
/// lower-bound-inclusive with the highest matching bound winning, so a value
/// past the last bound uses the last tier's rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatePolicy {
    /// Fixed cost regardless of cart contents.
    Flat {
        /// The flat rate.
        rate: Money,
    },
    /// Free above a subtotal threshold; not offered below it.
    Free {
        /// Minimum subtotal; `None` means always free.
        threshold: Option<Money>,
    },
    /// Tiered on cart subtotal.
    PriceBased {
        /// Ascending tiers.
        tiers: Vec<PriceTier>,
    },
    /// Tiered on cart weight.
    WeightBased {
        /// Ascending tiers.
        tiers: Vec<WeightTier>,
    },
}

impl RatePolicy {
    /// The cart context this policy needs, if any.
    ///
    /// Callers without a cart must either supply the context or accept that
    /// methods requiring it are omitted from a context-free listing.
    #[must_use]
    pub const fn required_context(&self) -> Option<RateContext> {
        match self {
            Self::Flat { .. } => None,
            Self::Free { threshold } => {
                if threshold.is_some() {
                    Some(RateContext::Subtotal)
                } else {
                    None
                }
            }
            Self::PriceBased { .. } => Some(RateContext::Subtotal),
            Self::WeightBased { .. } => Some(RateContext::Weight),
        }
    }

    /// Stable string form used for database storage.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Flat { .. } => "flat",
            Self::Free { .. } => "free",
            Self::PriceBased { .. } => "price_based",
            Self::WeightBased { .. } => "weight_based",
        }
    }
}

/// A purchasable delivery option within a zone.
#[derive(Debug, Clone)]
pub struct ShippingMethod {
    /// Method ID.
    pub id: MethodId,
    /// Owning zone.
    pub zone_id: ZoneId,
    /// Fulfilling carrier, if one is assigned.
    pub carrier_id: Option<CarrierId>,
    /// Display name (e.g. "Standard", "Express").
    pub name: String,
    /// Cost computation.
    pub policy: RatePolicy,
    /// Inactive methods are never offered.
    pub is_active: bool,
    /// Position in listings; ties broken by name.
    pub display_order: i32,
    /// Estimated delivery window in days (min, max).
    pub delivery_days: Option<(u8, u8)>,
}

/// A zone together with its methods and their carriers, as loaded for rate
/// computation.
#[derive(Debug, Clone)]
pub struct ZoneWithMethods {
    /// The zone.
    pub zone: ShippingZone,
    /// All methods configured for the zone (active and inactive).
    pub methods: Vec<ShippingMethod>,
    /// Carriers referenced by the methods.
    pub carriers: Vec<Carrier>,
}

impl ZoneWithMethods {
    /// Look up a carrier referenced by one of this zone's methods.
    #[must_use]
    pub fn carrier(&self, id: CarrierId) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.id == id)
    }
}
