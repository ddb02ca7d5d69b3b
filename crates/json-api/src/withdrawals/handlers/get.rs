//! Get Withdrawal Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::into_status_error, extensions::*, state::State,
    withdrawals::responses::WithdrawalResponse,
};

/// Get Withdrawal Handler
#[endpoint(
    tags("withdrawals"),
    summary = "Get Withdrawal",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Withdrawal found"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the owner"),
        (status_code = StatusCode::NOT_FOUND, description = "Withdrawal not found"),
    ),
)]
pub(crate) async fn handler(
    withdrawal: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<WithdrawalResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let withdrawal = state
        .app
        .withdrawals
        .get_withdrawal(actor, withdrawal.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(withdrawal.into()))
}
