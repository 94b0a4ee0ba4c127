//! Guest→user cart merge at login.

use thiserror::Error;
use tracing::instrument;

use marram_core::{GuestToken, UserId};

use crate::db::StoreError;
use crate::models::cart::MergeOutcome;
use crate::services::cart::CartStore;

/// Errors from the merge engine.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The merge kept losing races with concurrent cart mutations. The user
    /// is logged in; conflicting lines must be re-added by hand.
    #[error("cart merge kept conflicting with concurrent changes")]
    Contention,

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Folds a guest cart into the user's account when a guest logs in.
///
/// The store runs the whole merge as one atomic transaction; this engine
/// adds the retry policy on top. The operation is idempotent: once the guest
/// cart has been re-owned or absorbed, the token no longer resolves and a
/// second call is a no-op.
#[derive(Debug, Clone)]
pub struct CartMergeEngine<S> {
    store: S,
}

impl<S: CartStore> CartMergeEngine<S> {
    /// Create a merge engine.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Merge the guest cart identified by `token` into `user`'s account.
    ///
    /// Retries once on a transaction conflict (a second tab mutating the
    /// guest cart mid-merge), then surfaces [`MergeError::Contention`].
    ///
    /// # Errors
    ///
    /// Returns [`MergeError`] on contention exhaustion or persistence
    /// failure.
    #[instrument(skip(self, token))]
    pub async fn merge_on_login(
        &self,
        user: UserId,
        token: &GuestToken,
    ) -> Result<MergeOutcome, MergeError> {
        const ATTEMPTS: u32 = 2;

        for attempt in 1..=ATTEMPTS {
            match self.store.merge_guest_cart(token, user).await {
                Ok(outcome) => {
                    tracing::info!(%user, ?outcome, "cart merge finished");
                    return Ok(outcome);
                }
                Err(StoreError::Conflict(reason)) if attempt < ATTEMPTS => {
                    tracing::warn!(%user, %reason, attempt, "cart merge conflicted, retrying");
                }
                Err(StoreError::Conflict(reason)) => {
                    tracing::warn!(%user, %reason, "cart merge contention exhausted");
                    return Err(MergeError::Contention);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(MergeError::Contention)
    }
}
