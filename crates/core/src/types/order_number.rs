//! Human-presentable order numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A globally unique, human-presentable order identifier.
///
/// Numbers are short and sequential (`MR-100042`) so support staff and
/// customers can read them over the phone. Uniqueness is enforced by the
/// order store; this type only handles composition and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Compose a number from a store prefix and a sequence value.
    #[must_use]
    pub fn compose(prefix: &str, sequence: u32) -> Self {
        Self(format!("{prefix}-{sequence}"))
    }

    /// The full number as presented to customers.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The trailing sequence value, if the number ends in digits.
    ///
    /// Returns `None` for hand-issued or legacy numbers that do not follow
    /// the `<prefix>-<sequence>` form.
    #[must_use]
    pub fn sequence(&self) -> Option<u32> {
        self.0.rsplit('-').next()?.parse().ok()
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}
