//! Opaque guest session tokens.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque token identifying an anonymous shopper's cart.
///
/// Minted exclusively when a guest performs a genuine mutation (first
/// add-to-cart); read paths never create one. The token's internal structure
/// is never inspected - it is only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestToken(String);

impl GuestToken {
    /// Mint a fresh token.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GuestToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_tokens_are_distinct() {
        assert_ne!(GuestToken::mint(), GuestToken::mint());
    }

    #[test]
    fn test_roundtrip_from_string() {
        let token = GuestToken::from("abc-123".to_owned());
        assert_eq!(token.as_str(), "abc-123");
        assert_eq!(token.to_string(), "abc-123");
    }
}
