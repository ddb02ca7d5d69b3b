//! Get Return Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::into_status_error, extensions::*, returns::responses::ReturnDetailsResponse,
    state::State,
};

/// Get Return Handler
///
/// A return request together with the legs carrying it back.
#[endpoint(
    tags("returns"),
    summary = "Get Return",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Return found"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a party to this return"),
        (status_code = StatusCode::NOT_FOUND, description = "Return not found"),
    ),
)]
pub(crate) async fn handler(
    request: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ReturnDetailsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let details = state
        .app
        .returns
        .get_return(actor, request.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(ReturnDetailsResponse::for_actor(details, actor)))
}
