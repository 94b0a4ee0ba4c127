//! Shipping method listing.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use marram_core::{MethodId, Money};

use crate::error::{AppError, Result};
use crate::middleware::identity_from;
use crate::services::checkout::{CartTotals, CheckoutError};
use crate::state::AppState;

/// Query parameters for the method listing.
#[derive(Debug, Deserialize)]
pub struct MethodsQuery {
    pub country: Option<String>,
}

/// One offered method.
#[derive(Debug, Serialize)]
pub struct RateQuoteView {
    pub method_id: MethodId,
    pub name: String,
    pub cost: Money,
    pub delivery_days: Option<(u8, u8)>,
    pub requires_pickup_point: bool,
}

/// List candidate shipping methods for a destination country.
///
/// When the session has a resolvable, non-empty cart its totals feed the
/// context-dependent rate types; otherwise those methods are omitted from
/// the listing.
#[instrument(skip(state, session))]
pub async fn methods(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<MethodsQuery>,
) -> Result<Json<Vec<RateQuoteView>>> {
    let country = query
        .country
        .ok_or_else(|| AppError::BadRequest("missing country parameter".to_owned()))?;

    let identity = identity_from(&session).await?;
    let totals = cart_totals(&state, &identity).await?;

    let quotes = state
        .rate_engine()
        .quote(&country, totals.as_ref())
        .await?;

    Ok(Json(
        quotes
            .into_iter()
            .map(|quote| RateQuoteView {
                method_id: quote.method_id,
                name: quote.name,
                cost: quote.cost,
                delivery_days: quote.delivery_days,
                requires_pickup_point: quote.requires_pickup_point,
            })
            .collect(),
    ))
}

/// The session cart's totals, if a non-empty cart resolves.
async fn cart_totals(
    state: &AppState,
    identity: &crate::models::session::CartIdentity,
) -> Result<Option<CartTotals>> {
    let Some(cart) = state.cart_service().resolver().resolve(identity).await? else {
        return Ok(None);
    };
    match state.aggregator().summarize(cart.id).await {
        Ok(summary) => Ok(Some(summary.totals())),
        Err(CheckoutError::EmptyCart) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
