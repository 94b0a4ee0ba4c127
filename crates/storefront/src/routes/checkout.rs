//! Checkout route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use marram_core::{CountryCode, MethodId, Money, OrderNumber, Weight};

use crate::error::{AppError, Result};
use crate::middleware::identity_from;
use crate::models::order::Destination;
use crate::services::checkout::CheckoutError;
use crate::state::AppState;

/// One priced checkout line.
#[derive(Debug, Serialize)]
pub struct CheckoutLineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub unit_weight: Weight,
    pub line_total: Money,
}

/// The checkout summary view.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub lines: Vec<CheckoutLineView>,
    pub subtotal: Money,
    pub total_weight: Weight,
}

/// Display the checkout summary.
///
/// An empty or missing cart is a `cart_empty` error, not a zero summary, so
/// the frontend redirects instead of rendering a broken total.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let identity = identity_from(&session).await?;
    let cart = state
        .cart_service()
        .resolver()
        .resolve(&identity)
        .await?
        .ok_or(AppError::Checkout(CheckoutError::EmptyCart))?;
    let summary = state.aggregator().summarize(cart.id).await?;

    Ok(Json(CheckoutView {
        lines: summary
            .lines
            .iter()
            .map(|line| CheckoutLineView {
                name: line.name.clone(),
                quantity: line.item.quantity,
                unit_price: line.unit_price,
                unit_weight: line.unit_weight,
                line_total: line.line_total(),
            })
            .collect(),
        subtotal: summary.subtotal,
        total_weight: summary.total_weight,
    }))
}

/// Checkout confirmation request body.
#[derive(Debug, Deserialize)]
pub struct ConfirmCheckoutRequest {
    pub shipping_method_id: MethodId,
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub pickup_point_id: Option<String>,
}

/// Response for a placed order.
#[derive(Debug, Serialize)]
pub struct OrderPlacedView {
    pub number: OrderNumber,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total: Money,
}

/// Place the order for the resolved cart.
///
/// Called by the payment-confirmation callback (payment itself is handled
/// outside this service). Validates that the chosen method is actually
/// offered for the destination and this cart before persisting the
/// immutable order snapshot.
#[instrument(skip(state, session, request))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ConfirmCheckoutRequest>,
) -> Result<Json<OrderPlacedView>> {
    let identity = identity_from(&session).await?;
    let cart = state
        .cart_service()
        .resolver()
        .resolve(&identity)
        .await?
        .ok_or(AppError::Checkout(CheckoutError::EmptyCart))?;
    let summary = state.aggregator().summarize(cart.id).await?;
    let totals = summary.totals();

    let quotes = state
        .rate_engine()
        .quote(&request.country, Some(&totals))
        .await?;
    let quote = quotes
        .into_iter()
        .find(|q| q.method_id == request.shipping_method_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "shipping method {} is not offered for this destination",
                request.shipping_method_id
            ))
        })?;

    let country = CountryCode::parse(&request.country)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let destination = Destination {
        recipient: request.recipient,
        line1: request.line1,
        line2: request.line2,
        city: request.city,
        postal_code: request.postal_code,
        country,
        pickup_point_id: request.pickup_point_id,
    };

    let order = state
        .order_service()
        .place_order(&cart, &summary, &quote, destination)
        .await?;

    Ok(Json(OrderPlacedView {
        number: order.number,
        subtotal: order.subtotal,
        shipping_cost: order.shipping_cost,
        total: order.total,
    }))
}
