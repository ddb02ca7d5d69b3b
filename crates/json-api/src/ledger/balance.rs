//! Balance Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::ledger::records::Balance;

use crate::{errors::into_status_error, extensions::*, state::State};

/// Balance Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BalanceResponse {
    pub user_uuid: Uuid,

    /// Signed balance in minor units
    pub balance: i64,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self {
            user_uuid: balance.user,
            balance: balance.balance,
        }
    }
}

/// Balance Handler
#[endpoint(
    tags("ledger"),
    summary = "Get Balance",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Current balance"),
        (status_code = StatusCode::FORBIDDEN, description = "Another user's account"),
        (status_code = StatusCode::NOT_FOUND, description = "User not found"),
    ),
)]
pub(crate) async fn handler(
    user: QueryParam<Uuid, false>,
    depot: &mut Depot,
) -> Result<Json<BalanceResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let user = user.into_inner().unwrap_or(actor.user);

    let balance = state
        .app
        .ledger
        .balance(actor, user.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(balance.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::ledger::LedgerServiceError;

    use crate::test_helpers::{CUSTOMER, Mocks, SUPPLIER, customer, service_as};

    use super::*;

    fn route() -> Router {
        Router::with_path("ledger/balance").get(handler)
    }

    #[tokio::test]
    async fn defaults_to_the_callers_account() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .ledger
            .expect_balance()
            .once()
            .withf(|_, user| user.into_uuid() == CUSTOMER)
            .return_once(|_, user| {
                Ok(Balance {
                    user: user.into_uuid(),
                    balance: -650,
                })
            });

        let mut res = TestClient::get("http://example.com/ledger/balance")
            .send(&service_as(customer(), mocks, route()))
            .await;

        let body: BalanceResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.user_uuid, CUSTOMER);
        assert_eq!(body.balance, -650);

        Ok(())
    }

    #[tokio::test]
    async fn other_accounts_are_forbidden() {
        let mut mocks = Mocks::default();

        mocks
            .ledger
            .expect_balance()
            .once()
            .withf(|_, user| user.into_uuid() == SUPPLIER)
            .return_once(|_, _| Err(LedgerServiceError::Forbidden));

        let res = TestClient::get(format!("http://example.com/ledger/balance?user={SUPPLIER}"))
            .send(&service_as(customer(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }
}
