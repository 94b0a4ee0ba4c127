//! Money and weight amounts.
//!
//! Both types are integer-backed: money is stored in the smallest currency
//! unit (cents) and weight in grams. Line-level arithmetic saturates rather
//! than wrapping so a corrupt quantity can never flip a total negative.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the smallest currency unit (cents).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Multiply a unit amount by a line quantity.
    #[must_use]
    pub const fn times(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// The amount as a decimal in the currency's standard unit.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.as_decimal())
    }
}

/// A weight in grams.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Weight(i64);

impl Weight {
    /// Zero weight.
    pub const ZERO: Self = Self(0);

    /// Create a weight from grams.
    #[must_use]
    pub const fn from_grams(grams: i64) -> Self {
        Self(grams)
    }

    /// The weight in grams.
    #[must_use]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    /// Multiply a unit weight by a line quantity.
    #[must_use]
    pub const fn times(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }
}

impl Add for Weight {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}g", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1999).to_string(), "$19.99");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_money_line_arithmetic() {
        let unit = Money::from_cents(250);
        assert_eq!(unit.times(3), Money::from_cents(750));
        assert_eq!(
            [Money::from_cents(100), Money::from_cents(23)]
                .into_iter()
                .sum::<Money>(),
            Money::from_cents(123)
        );
    }

    #[test]
    fn test_money_saturates() {
        let huge = Money::from_cents(i64::MAX);
        assert_eq!(huge.times(2), Money::from_cents(i64::MAX));
        assert_eq!(huge + Money::from_cents(1), Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_weight_sum() {
        let total: Weight = [Weight::from_grams(400), Weight::from_grams(800)]
            .into_iter()
            .sum();
        assert_eq!(total, Weight::from_grams(1200));
        assert_eq!(total.to_string(), "1200g");
    }
}
