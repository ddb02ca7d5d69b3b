//! Get Shipment Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::into_status_error, extensions::*, shipments::responses::ShipmentResponse,
    state::State,
};

/// Get Shipment Handler
#[endpoint(
    tags("shipments"),
    summary = "Get Shipment",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Shipment found"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a party to this leg"),
        (status_code = StatusCode::NOT_FOUND, description = "Shipment not found"),
    ),
)]
pub(crate) async fn handler(
    shipment: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ShipmentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let shipment = state
        .app
        .shipments
        .get_shipment(actor, shipment.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(shipment.into()))
}
