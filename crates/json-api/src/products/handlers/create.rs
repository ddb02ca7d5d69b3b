//! Create Product Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::products::data::NewProduct;

use crate::{
    errors::into_status_error, extensions::*, products::responses::ProductResponse, state::State,
};

/// Create Product Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateProductRequest {
    pub uuid: Uuid,

    /// Selling supplier, defaults to the caller
    #[serde(default)]
    pub supplier_uuid: Option<Uuid>,

    pub name: String,
    pub price: u64,
    pub stock: u64,
}

/// Create Product Handler
///
/// Suppliers list their own products; admins may list on a supplier's behalf.
#[endpoint(
    tags("products"),
    summary = "Create Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Product created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid product data"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the supplier"),
        (status_code = StatusCode::CONFLICT, description = "Product already exists"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateProductRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let request = json.into_inner();

    let product = NewProduct {
        uuid: request.uuid.into(),
        supplier_uuid: request.supplier_uuid.unwrap_or(actor.user).into(),
        name: request.name,
        price: request.price,
        stock: request.stock,
    };

    let product = state
        .app
        .products
        .create_product(actor, product)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/products/{}", product.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(product.into()))
}
