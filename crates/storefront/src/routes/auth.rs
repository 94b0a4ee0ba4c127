//! Session boundary: the login notification hook.
//!
//! Authentication itself (passwords, OAuth, sessions issuance) lives outside
//! this repository; the identity provider integration calls this endpoint
//! exactly once when a guest becomes authenticated. That moment is the only
//! trigger for the guest→user cart merge.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use marram_core::{GuestToken, UserId};

use crate::error::Result;
use crate::middleware::identity_from;
use crate::models::cart::MergeOutcome;
use crate::models::session::keys;
use crate::state::AppState;

/// Login notification body.
#[derive(Debug, Deserialize)]
pub struct SessionStartedRequest {
    pub user_id: UserId,
}

/// Result of the login-time merge.
#[derive(Debug, Serialize)]
pub struct MergeView {
    pub outcome: &'static str,
    pub lines_moved: u32,
    pub lines_combined: u32,
}

impl From<MergeOutcome> for MergeView {
    fn from(outcome: MergeOutcome) -> Self {
        match outcome {
            MergeOutcome::NoGuestCart => Self {
                outcome: "no_guest_cart",
                lines_moved: 0,
                lines_combined: 0,
            },
            MergeOutcome::Reassigned { .. } => Self {
                outcome: "reassigned",
                lines_moved: 0,
                lines_combined: 0,
            },
            MergeOutcome::Merged {
                lines_moved,
                lines_combined,
                ..
            } => Self {
                outcome: "merged",
                lines_moved,
                lines_combined,
            },
        }
    }
}

/// Record the authenticated user in the session and run the one-time cart
/// merge if a guest cart exists.
#[instrument(skip(state, session, request))]
pub async fn session_started(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SessionStartedRequest>,
) -> Result<Json<MergeView>> {
    let identity = identity_from(&session).await?;
    session.insert(keys::CURRENT_USER, request.user_id).await?;

    let Some(token) = identity.guest else {
        return Ok(Json(MergeOutcome::NoGuestCart.into()));
    };

    let outcome = state
        .merge_engine()
        .merge_on_login(request.user_id, &token)
        .await?;
    // The token no longer resolves to anything; drop it from the session so
    // later logins do not re-run the merge.
    session.remove::<GuestToken>(keys::GUEST_TOKEN).await?;

    Ok(Json(outcome.into()))
}
