//! List Withdrawals Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use souq::withdrawals::WithdrawStatus;

use crate::{
    errors::into_status_error, extensions::*, state::State,
    withdrawals::responses::WithdrawalResponse,
};

/// List Withdrawals Handler
///
/// Admins see every withdrawal, everyone else their own. `status` narrows the list, e.g.
/// `awaiting_approval` for the review queue.
#[endpoint(
    tags("withdrawals"),
    summary = "List Withdrawals",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Withdrawals"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status"),
    ),
)]
pub(crate) async fn handler(
    status: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<Vec<WithdrawalResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let status = status
        .into_inner()
        .map(|value| value.parse::<WithdrawStatus>())
        .transpose()
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    let withdrawals = state
        .app
        .withdrawals
        .list_withdrawals(actor, status)
        .await
        .map_err(into_status_error)?;

    Ok(Json(withdrawals.into_iter().map(Into::into).collect()))
}
