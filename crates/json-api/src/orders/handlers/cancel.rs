//! Cancel Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{errors::into_status_error, extensions::*, orders::responses::OrderResponse, state::State};

/// Cancel Order Handler
///
/// Cancels every leg, restores stock, reverses cashback and refunds a paid order to the buyer's
/// balance. Only possible before any leg is picked up.
#[endpoint(
    tags("orders"),
    summary = "Cancel Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the buyer"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "A leg is already in transit"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let cancelled = state
        .app
        .orders
        .cancel_order(actor, order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(cancelled.into()))
}
