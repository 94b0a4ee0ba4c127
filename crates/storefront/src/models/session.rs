//! Session-related types.
//!
//! The session carries only the opaque identity values the checkout core
//! consumes: the logged-in user id and the minted guest token. Their internal
//! structure is never inspected here.

use serde::{Deserialize, Serialize};

use marram_core::{GuestToken, UserId};

/// The identity a request carries into cart resolution.
///
/// Read paths never create either value; a guest token is minted exclusively
/// by the add-to-cart mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartIdentity {
    /// Logged-in user, if any.
    pub user: Option<UserId>,
    /// Guest session token, if one has been minted.
    pub guest: Option<GuestToken>,
}

impl CartIdentity {
    /// Whether the request carries no identity at all.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.user.is_none() && self.guest.is_none()
    }
}

/// Session keys for identity data.
pub mod keys {
    /// Key for storing the logged-in user id.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the guest cart token.
    pub const GUEST_TOKEN: &str = "guest_token";
}
