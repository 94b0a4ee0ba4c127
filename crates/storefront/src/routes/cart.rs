//! Cart route handlers.
//!
//! The cart view is a JSON projection of the checkout aggregation; an
//! identity with no cart (or an empty cart) renders the empty view rather
//! than an error, because the cart page is a read path.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use marram_core::{CartItemId, GuestToken, Money, ProductId, VariantId, Weight};

use crate::error::Result;
use crate::middleware::identity_from;
use crate::models::session::{CartIdentity, keys};
use crate::services::checkout::{CheckoutError, CheckoutSummary};
use crate::state::AppState;

/// Cart line view.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Cart view.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Money,
    pub total_weight: Weight,
    pub item_count: u32,
}

impl CartView {
    /// The empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Money::ZERO,
            total_weight: Weight::ZERO,
            item_count: 0,
        }
    }
}

impl From<CheckoutSummary> for CartView {
    fn from(summary: CheckoutSummary) -> Self {
        let item_count = summary.lines.iter().map(|l| l.item.quantity).sum();
        Self {
            items: summary
                .lines
                .iter()
                .map(|line| CartItemView {
                    id: line.item.id,
                    product_id: line.item.product_id,
                    variant_id: line.item.variant_id,
                    name: line.name.clone(),
                    quantity: line.item.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total(),
                })
                .collect(),
            subtotal: summary.subtotal,
            total_weight: summary.total_weight,
            item_count,
        }
    }
}

/// Build the cart view for an identity; empty when no cart or no items.
async fn cart_view(state: &AppState, identity: &CartIdentity) -> Result<CartView> {
    let service = state.cart_service();
    let Some(cart) = service.resolver().resolve(identity).await? else {
        return Ok(CartView::empty());
    };
    match state.aggregator().summarize(cart.id).await {
        Ok(summary) => Ok(summary.into()),
        Err(CheckoutError::EmptyCart) => Ok(CartView::empty()),
        Err(err) => Err(err.into()),
    }
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: Option<u32>,
}

/// Update cart line request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

/// Display the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let identity = identity_from(&session).await?;
    Ok(Json(cart_view(&state, &identity).await?))
}

/// Add an item to the cart.
///
/// The only place a guest token is minted: an anonymous shopper performing
/// this genuine mutation gets a token stored in the session, and the cart is
/// created lazily under it.
#[instrument(skip(state, session, request))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let mut identity = identity_from(&session).await?;
    if identity.is_anonymous() {
        let token = GuestToken::mint();
        session.insert(keys::GUEST_TOKEN, &token).await?;
        identity.guest = Some(token);
    }

    state
        .cart_service()
        .add_item(
            &identity,
            crate::services::cart::AddItem {
                product: request.product_id,
                variant: request.variant_id,
                quantity: request.quantity.unwrap_or(1),
            },
        )
        .await?;

    Ok(Json(cart_view(&state, &identity).await?))
}

/// Set a cart line's quantity (0 removes it).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CartItemId>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<CartView>> {
    let identity = identity_from(&session).await?;
    state
        .cart_service()
        .set_quantity(&identity, id, request.quantity)
        .await?;
    Ok(Json(cart_view(&state, &identity).await?))
}

/// Remove a cart line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CartItemId>,
) -> Result<Json<CartView>> {
    let identity = identity_from(&session).await?;
    state.cart_service().remove_item(&identity, id).await?;
    Ok(Json(cart_view(&state, &identity).await?))
}
