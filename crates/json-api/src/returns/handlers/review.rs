//! Return Review Handlers

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::into_status_error,
    extensions::*,
    returns::responses::{ReturnDetailsResponse, ReturnResponse},
    state::State,
};

/// Approve Return Handler
///
/// The supplier accepts the return; legs back to them are routed and created.
#[endpoint(
    tags("returns"),
    summary = "Approve Return",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Return approved"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the supplier"),
        (status_code = StatusCode::CONFLICT, description = "Return already reviewed"),
    ),
)]
pub(crate) async fn approve(
    request: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ReturnDetailsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let details = state
        .app
        .returns
        .approve_return(actor, request.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(ReturnDetailsResponse::for_actor(details, actor)))
}

/// Reject Return Handler
#[endpoint(
    tags("returns"),
    summary = "Reject Return",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Return rejected"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the supplier"),
        (status_code = StatusCode::CONFLICT, description = "Return already reviewed"),
    ),
)]
pub(crate) async fn reject(
    request: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ReturnResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let request = state
        .app
        .returns
        .reject_return(actor, request.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(ReturnResponse::for_actor(request, actor)))
}
