//! Address book route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use marram_core::{AddressId, CountryCode, UserId};

use crate::error::{AppError, Result};
use crate::middleware::identity_from;
use crate::models::address::{Address, NewAddress};
use crate::state::AppState;

/// Address view.
#[derive(Debug, Serialize)]
pub struct AddressView {
    pub id: AddressId,
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: CountryCode,
    pub is_default_shipping: bool,
    pub is_default_billing: bool,
}

impl From<Address> for AddressView {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            recipient: address.recipient,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            postal_code: address.postal_code,
            country: address.country,
            is_default_shipping: address.is_default_shipping,
            is_default_billing: address.is_default_billing,
        }
    }
}

/// Create address request body.
#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub default_shipping: bool,
    #[serde(default)]
    pub default_billing: bool,
}

async fn require_user(session: &Session) -> Result<UserId> {
    identity_from(session)
        .await?
        .user
        .ok_or_else(|| AppError::Unauthorized("login required".to_owned()))
}

/// List the user's addresses.
#[instrument(skip(state, session))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<AddressView>>> {
    let user = require_user(&session).await?;
    let addresses = state.addresses().list_for_user(user).await?;
    Ok(Json(addresses.into_iter().map(AddressView::from).collect()))
}

/// Create an address, optionally as a default.
#[instrument(skip(state, session, request))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateAddressRequest>,
) -> Result<Json<AddressView>> {
    let user = require_user(&session).await?;
    let country = CountryCode::parse(&request.country)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let address = NewAddress {
        recipient: request.recipient,
        line1: request.line1,
        line2: request.line2,
        city: request.city,
        postal_code: request.postal_code,
        country,
    };
    let created = state
        .addresses()
        .create(user, &address, request.default_shipping, request.default_billing)
        .await?;
    Ok(Json(created.into()))
}

/// Make an address the default shipping address.
#[instrument(skip(state, session))]
pub async fn make_default_shipping(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AddressId>,
) -> Result<Json<Vec<AddressView>>> {
    let user = require_user(&session).await?;
    state.addresses().set_default_shipping(user, id).await?;
    let addresses = state.addresses().list_for_user(user).await?;
    Ok(Json(addresses.into_iter().map(AddressView::from).collect()))
}

/// Make an address the default billing address.
#[instrument(skip(state, session))]
pub async fn make_default_billing(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AddressId>,
) -> Result<Json<Vec<AddressView>>> {
    let user = require_user(&session).await?;
    state.addresses().set_default_billing(user, id).await?;
    let addresses = state.addresses().list_for_user(user).await?;
    Ok(Json(addresses.into_iter().map(AddressView::from).collect()))
}
