//! Transaction History Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::ledger::records::TransactionRecord;

use crate::{errors::into_status_error, extensions::*, state::State};

const DEFAULT_LIMIT: u32 = 50;

/// Transaction Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TransactionResponse {
    pub uuid: Uuid,

    /// `purchase`, `cashback`, `refund`, `sale`, `delivery_fee`, ...
    #[serde(rename = "type")]
    pub kind: String,

    /// Signed amount in minor units
    pub amount: i64,

    /// Kind of the entity this transaction documents
    pub related_kind: String,

    pub related_uuid: Uuid,
    pub created_at: String,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(transaction: TransactionRecord) -> Self {
        Self {
            uuid: transaction.uuid.into_uuid(),
            kind: transaction.kind.to_string(),
            amount: transaction.amount,
            related_kind: transaction.related.kind().to_string(),
            related_uuid: transaction.related.uuid(),
            created_at: transaction.created_at.to_string(),
        }
    }
}

/// Transaction History Handler
///
/// Most recent transactions first.
#[endpoint(
    tags("ledger"),
    summary = "List Transactions",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Transactions"),
        (status_code = StatusCode::FORBIDDEN, description = "Another user's account"),
    ),
)]
pub(crate) async fn handler(
    user: QueryParam<Uuid, false>,
    limit: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<Vec<TransactionResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let user = user.into_inner().unwrap_or(actor.user);

    let transactions = state
        .app
        .ledger
        .history(
            actor,
            user.into(),
            limit.into_inner().unwrap_or(DEFAULT_LIMIT),
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq::ledger::TransactionType;

    use crate::test_helpers::{CUSTOMER, Mocks, customer, make_transaction, service_as};

    use super::*;

    fn route() -> Router {
        Router::with_path("ledger/transactions").get(handler)
    }

    #[tokio::test]
    async fn lists_signed_postings() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .ledger
            .expect_history()
            .once()
            .withf(|_, user, limit| user.into_uuid() == CUSTOMER && *limit == 10)
            .return_once(|_, _, _| {
                Ok(vec![
                    make_transaction(TransactionType::Cashback, 650),
                    make_transaction(TransactionType::Purchase, -13_000),
                ])
            });

        let mut res = TestClient::get("http://example.com/ledger/transactions?limit=10")
            .send(&service_as(customer(), mocks, route()))
            .await;

        let body: Vec<TransactionResponse> = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            body.iter()
                .map(|t| (t.kind.as_str(), t.amount))
                .collect::<Vec<_>>(),
            vec![("cashback", 650), ("purchase", -13_000)]
        );
        assert!(
            body.iter().all(|t| t.related_kind == "order"),
            "fixtures relate to orders"
        );

        Ok(())
    }

    #[tokio::test]
    async fn limit_defaults_when_omitted() {
        let mut mocks = Mocks::default();

        mocks
            .ledger
            .expect_history()
            .once()
            .withf(|_, _, limit| *limit == DEFAULT_LIMIT)
            .return_once(|_, _, _| Ok(Vec::new()));

        let res = TestClient::get("http://example.com/ledger/transactions")
            .send(&service_as(customer(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
    }
}
