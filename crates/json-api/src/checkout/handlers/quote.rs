//! Quote Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    checkout::responses::QuoteResponse, errors::into_status_error, extensions::*, state::State,
};

/// Quote Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteRequest {
    /// Delivery address, which decides the destination region
    pub address_uuid: Uuid,

    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Quote Handler
///
/// Prices the caller's cart per supplier without reserving anything. Quotes are cached briefly
/// and are never used to place an order.
#[endpoint(
    tags("checkout"),
    summary = "Quote Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart priced"),
        (status_code = StatusCode::BAD_REQUEST, description = "Empty cart"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a customer or not their address"),
        (status_code = StatusCode::NOT_FOUND, description = "Address or coupon not found"),
        (status_code = StatusCode::CONFLICT, description = "Coupon expired or exhausted"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<QuoteRequest>,
    depot: &mut Depot,
) -> Result<Json<QuoteResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let request = json.into_inner();

    let quote = state
        .app
        .checkout
        .quote(actor, request.address_uuid.into(), request.coupon_code)
        .await
        .map_err(into_status_error)?;

    Ok(Json(quote.into()))
}
