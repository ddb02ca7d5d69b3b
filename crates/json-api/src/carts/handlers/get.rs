//! Get Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{carts::responses::CartResponse, errors::into_status_error, extensions::*, state::State};

/// Get Cart Handler
///
/// The caller's cart. An empty one is opened on first use.
#[endpoint(
    tags("carts"),
    summary = "Get Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart found"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let cart = state
        .app
        .carts
        .get_cart(actor.user.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}
