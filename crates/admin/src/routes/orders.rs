//! Order shipment handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marram_core::{OrderId, OrderNumber, OrderStatus};

use crate::error::{AppError, Result};
use crate::services::labels::ShipmentStore;
use crate::state::AppState;

/// Shipment state view of an order.
#[derive(Debug, Serialize)]
pub struct OrderShipmentView {
    pub id: OrderId,
    pub number: OrderNumber,
    pub status: OrderStatus,
    pub pickup_point_id: Option<String>,
    pub shipment_number: Option<String>,
}

/// Query params for the label endpoint.
#[derive(Debug, Deserialize)]
pub struct LabelQuery {
    /// Book the shipment first if none exists yet.
    #[serde(default)]
    pub create: bool,
}

/// Show the shipment state of an order.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderShipmentView>> {
    let store = crate::db::PgShipmentStore::new(state.pool().clone());
    let order = store
        .find_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(Json(OrderShipmentView {
        id: order.id,
        number: order.number,
        status: order.status,
        pickup_point_id: order.pickup_point_id,
        shipment_number: order.shipment_number.map(|s| s.as_str().to_owned()),
    }))
}

/// Stream an order's label, booking the shipment first when `create=true`.
///
/// The response carries the document bytes with a content-disposition
/// filename of the form `label-<order-number>.<ext>`.
#[instrument(skip(state))]
pub async fn label(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Query(query): Query<LabelQuery>,
) -> Result<Response> {
    let label = state.label_manager().request_label(id, query.create).await?;

    let headers = AppendHeaders([
        (header::CONTENT_TYPE, label.content_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", label.filename),
        ),
    ]);
    Ok((headers, label.bytes).into_response())
}
