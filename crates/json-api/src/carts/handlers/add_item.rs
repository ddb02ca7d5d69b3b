//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::carts::data::NewCartItem;

use crate::{
    carts::responses::CartItemResponse, errors::into_status_error, extensions::*, state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartItemRequest {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub quantity: u32,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub size: Option<String>,
}

impl From<AddCartItemRequest> for NewCartItem {
    fn from(request: AddCartItemRequest) -> Self {
        NewCartItem {
            uuid: request.uuid.into(),
            product_uuid: request.product_uuid.into(),
            quantity: request.quantity,
            color: request.color,
            size: request.size,
        }
    }
}

/// Add Cart Item Handler
#[endpoint(
    tags("carts"),
    summary = "Add Item to Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Cart item added"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown product or invalid quantity"),
        (status_code = StatusCode::CONFLICT, description = "Cart item already exists"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartItemResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let item = state
        .app
        .carts
        .add_item(actor.user.into(), json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/cart/items/{}", item.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(item.into()))
}
