//! Place Order Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq::orders::PaymentMethod;
use souq_app::domain::checkout::data::{Checkout, CheckoutOutcome};

use crate::{
    checkout::responses::CheckoutResponse, errors::into_status_error, extensions::*,
    state::State,
};

/// Place Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PlaceOrderRequest {
    pub address_uuid: Uuid,

    #[serde(default)]
    pub coupon_code: Option<String>,

    /// `cash_on_delivery`, `credit_card` or `balance`
    pub payment_method: String,
}

impl TryFrom<PlaceOrderRequest> for Checkout {
    type Error = StatusError;

    fn try_from(request: PlaceOrderRequest) -> Result<Self, Self::Error> {
        let payment_method = request
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

        Ok(Checkout {
            address_uuid: request.address_uuid.into(),
            coupon_code: request.coupon_code,
            payment_method,
        })
    }
}

/// Place Order Handler
///
/// Turns the caller's cart into an order. Card checkouts return a pending payment instead; the
/// order is assembled once the gateway confirms it.
#[endpoint(
    tags("checkout"),
    summary = "Place Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::ACCEPTED, description = "Awaiting card payment"),
        (status_code = StatusCode::BAD_REQUEST, description = "Empty cart or unknown payment method"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a customer or not their address"),
        (status_code = StatusCode::NOT_FOUND, description = "Address or coupon not found"),
        (status_code = StatusCode::CONFLICT, description = "Insufficient stock or balance, or coupon unusable"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<PlaceOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let checkout = Checkout::try_from(json.into_inner())?;

    let outcome = state
        .app
        .checkout
        .place_order(actor, checkout)
        .await
        .map_err(into_status_error)?;

    match &outcome {
        CheckoutOutcome::Order(order) => {
            res.add_header(LOCATION, format!("/orders/{}", order.uuid), true)
                .or_500("failed to set location header")?
                .status_code(StatusCode::CREATED);
        }
        CheckoutOutcome::PaymentPending(payment) => {
            res.add_header(LOCATION, format!("/payments/{}", payment.uuid), true)
                .or_500("failed to set location header")?
                .status_code(StatusCode::ACCEPTED);
        }
    }

    Ok(Json(outcome.into()))
}
