//! Withdrawal Workflow Handlers
//!
//! Admin review (approve, reject) and payout processing (process, complete).

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::into_status_error, extensions::*, state::State,
    withdrawals::responses::WithdrawalResponse,
};

/// Approve Withdrawal Handler
#[endpoint(
    tags("withdrawals"),
    summary = "Approve Withdrawal",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Withdrawal approved"),
        (status_code = StatusCode::FORBIDDEN, description = "Admins only"),
        (status_code = StatusCode::CONFLICT, description = "Not awaiting approval"),
    ),
)]
pub(crate) async fn approve(
    withdrawal: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<WithdrawalResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let withdrawal = state
        .app
        .withdrawals
        .approve_withdrawal(actor, withdrawal.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(withdrawal.into()))
}

/// Reject Withdrawal Handler
///
/// The held amount goes back to the requester's balance.
#[endpoint(
    tags("withdrawals"),
    summary = "Reject Withdrawal",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Withdrawal rejected"),
        (status_code = StatusCode::FORBIDDEN, description = "Admins only"),
        (status_code = StatusCode::CONFLICT, description = "Already processed"),
    ),
)]
pub(crate) async fn reject(
    withdrawal: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<WithdrawalResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let withdrawal = state
        .app
        .withdrawals
        .reject_withdrawal(actor, withdrawal.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(withdrawal.into()))
}

/// Process Withdrawal Handler
///
/// Claims an approved request for payout. Only one concurrent claim succeeds.
#[endpoint(
    tags("withdrawals"),
    summary = "Process Withdrawal",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Withdrawal processing"),
        (status_code = StatusCode::FORBIDDEN, description = "Admins only"),
        (status_code = StatusCode::CONFLICT, description = "Not approved or already claimed"),
    ),
)]
pub(crate) async fn process(
    withdrawal: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<WithdrawalResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let withdrawal = state
        .app
        .withdrawals
        .process_withdrawal(actor, withdrawal.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(withdrawal.into()))
}

/// Complete Withdrawal Handler
#[endpoint(
    tags("withdrawals"),
    summary = "Complete Withdrawal",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Withdrawal paid out"),
        (status_code = StatusCode::FORBIDDEN, description = "Admins only"),
        (status_code = StatusCode::CONFLICT, description = "Not processing"),
    ),
)]
pub(crate) async fn complete(
    withdrawal: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<WithdrawalResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let withdrawal = state
        .app
        .withdrawals
        .complete_withdrawal(actor, withdrawal.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(withdrawal.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq::withdrawals::{WithdrawStatus, WithdrawalError};
    use souq_app::domain::withdrawals::{WithdrawalsServiceError, records::WithdrawalUuid};

    use crate::test_helpers::{Mocks, admin, make_withdrawal, service_as, supplier};

    use super::*;

    fn router() -> Router {
        Router::with_path("withdrawals/{withdrawal}")
            .push(Router::with_path("approve").post(approve))
            .push(Router::with_path("reject").post(reject))
            .push(Router::with_path("process").post(process))
            .push(Router::with_path("complete").post(complete))
    }

    #[tokio::test]
    async fn admin_walks_a_withdrawal_to_completion() -> TestResult {
        let uuid = WithdrawalUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .withdrawals
            .expect_approve_withdrawal()
            .once()
            .return_once(move |_, _| Ok(make_withdrawal(uuid, WithdrawStatus::Approved)));
        mocks
            .withdrawals
            .expect_process_withdrawal()
            .once()
            .return_once(move |_, _| Ok(make_withdrawal(uuid, WithdrawStatus::Processing)));
        mocks
            .withdrawals
            .expect_complete_withdrawal()
            .once()
            .return_once(move |_, _| Ok(make_withdrawal(uuid, WithdrawStatus::Completed)));

        let service = service_as(admin(), mocks, router());
        let mut statuses = Vec::new();

        for step in ["approve", "process", "complete"] {
            let mut res = TestClient::post(format!("http://example.com/withdrawals/{uuid}/{step}"))
                .send(&service)
                .await;

            let body: WithdrawalResponse = res.take_json().await?;

            statuses.push(body.status);
        }

        assert_eq!(statuses, ["approved", "processing", "completed"]);

        Ok(())
    }

    #[tokio::test]
    async fn only_admins_review() {
        let uuid = WithdrawalUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .withdrawals
            .expect_reject_withdrawal()
            .once()
            .return_once(|_, _| Err(WithdrawalsServiceError::Forbidden));

        let res = TestClient::post(format!("http://example.com/withdrawals/{uuid}/reject"))
            .send(&service_as(supplier(), mocks, router()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn double_claims_conflict() {
        let uuid = WithdrawalUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .withdrawals
            .expect_process_withdrawal()
            .once()
            .return_once(|_, _| {
                Err(WithdrawalsServiceError::Withdrawal(
                    WithdrawalError::InvalidTransition {
                        step: "process",
                        status: WithdrawStatus::Processing,
                    },
                ))
            });

        let res = TestClient::post(format!("http://example.com/withdrawals/{uuid}/process"))
            .send(&service_as(admin(), mocks, router()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
    }
}
