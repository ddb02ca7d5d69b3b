//! Request Withdrawal Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use souq::withdrawals::TransferType;
use souq_app::domain::withdrawals::data::WithdrawalRequest;

use crate::{
    errors::into_status_error, extensions::*, state::State,
    withdrawals::responses::WithdrawalResponse,
};

/// Request Withdrawal Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RequestWithdrawalRequest {
    /// Amount to pay out in minor units
    pub amount: u64,

    /// `bank_transfer` or `mobile_wallet`
    pub transfer_type: String,

    /// IBAN or wallet number
    pub destination: String,
}

impl TryFrom<RequestWithdrawalRequest> for WithdrawalRequest {
    type Error = StatusError;

    fn try_from(request: RequestWithdrawalRequest) -> Result<Self, Self::Error> {
        let transfer_type = request
            .transfer_type
            .parse::<TransferType>()
            .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

        Ok(WithdrawalRequest {
            amount: request.amount,
            transfer_type,
            destination: request.destination,
        })
    }
}

/// Request Withdrawal Handler
///
/// Holds the amount from the caller's balance straight away. Requests above the review threshold
/// wait for an admin.
#[endpoint(
    tags("withdrawals"),
    summary = "Request Withdrawal",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Withdrawal requested"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid amount, type or destination"),
        (status_code = StatusCode::CONFLICT, description = "Insufficient balance"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<RequestWithdrawalRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<WithdrawalResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let request = WithdrawalRequest::try_from(json.into_inner())?;

    let withdrawal = state
        .app
        .withdrawals
        .request_withdrawal(actor, request)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/withdrawals/{}", withdrawal.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(withdrawal.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use souq::{ledger::LedgerError, withdrawals::WithdrawStatus};
    use souq_app::domain::withdrawals::{WithdrawalsServiceError, records::WithdrawalUuid};

    use crate::test_helpers::{Mocks, make_withdrawal, service_as, supplier};

    use super::*;

    fn route() -> Router {
        Router::with_path("withdrawals").post(handler)
    }

    #[tokio::test]
    async fn small_requests_come_back_approved() -> TestResult {
        let uuid = WithdrawalUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .withdrawals
            .expect_request_withdrawal()
            .once()
            .withf(|_, request| {
                *request
                    == WithdrawalRequest {
                        amount: 20_000,
                        transfer_type: TransferType::MobileWallet,
                        destination: "01000000000".to_string(),
                    }
            })
            .return_once(move |_, _| Ok(make_withdrawal(uuid, WithdrawStatus::Approved)));

        let mut res = TestClient::post("http://example.com/withdrawals")
            .json(&json!({
                "amount": 20_000,
                "transfer_type": "mobile_wallet",
                "destination": "01000000000",
            }))
            .send(&service_as(supplier(), mocks, route()))
            .await;

        let body: WithdrawalResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.status, "approved");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_transfer_type_never_reaches_the_service() {
        let mut mocks = Mocks::default();

        mocks.withdrawals.expect_request_withdrawal().never();

        let res = TestClient::post("http://example.com/withdrawals")
            .json(&json!({
                "amount": 20_000,
                "transfer_type": "carrier_pigeon",
                "destination": "roof",
            }))
            .send(&service_as(supplier(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn overdrawn_requests_conflict() {
        let mut mocks = Mocks::default();

        mocks
            .withdrawals
            .expect_request_withdrawal()
            .once()
            .return_once(|_, _| {
                Err(WithdrawalsServiceError::Ledger(
                    LedgerError::InsufficientBalance {
                        balance: 1_000,
                        required: 20_000,
                    },
                ))
            });

        let res = TestClient::post("http://example.com/withdrawals")
            .json(&json!({
                "amount": 20_000,
                "transfer_type": "bank_transfer",
                "destination": "EG380019000500000000263180002",
            }))
            .send(&service_as(supplier(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
    }
}
