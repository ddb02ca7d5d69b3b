//! List Returns Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    errors::into_status_error, extensions::*, returns::responses::ReturnResponse, state::State,
};

/// List Returns Handler
///
/// Returns the caller opened as a customer or received as a supplier.
#[endpoint(
    tags("returns"),
    summary = "List Returns",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<Vec<ReturnResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let requests = state
        .app
        .returns
        .list_returns(actor)
        .await
        .map_err(into_status_error)?;

    Ok(Json(
        requests
            .into_iter()
            .map(|request| ReturnResponse::for_actor(request, actor))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq::returns::ReturnStatus;
    use souq_app::domain::returns::records::ReturnRequestUuid;

    use crate::test_helpers::{Mocks, customer, make_return, service_as};

    use super::*;

    #[tokio::test]
    async fn lists_returns_without_codes_for_customers() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.returns.expect_list_returns().once().return_once(|_| {
            Ok(vec![
                make_return(ReturnRequestUuid::new(), ReturnStatus::Requested),
                make_return(ReturnRequestUuid::new(), ReturnStatus::Completed),
            ])
        });

        let mut res = TestClient::get("http://example.com/returns")
            .send(&service_as(
                customer(),
                mocks,
                Router::with_path("returns").get(handler),
            ))
            .await;

        let body: Vec<ReturnResponse> = res.take_json().await?;

        assert_eq!(body.len(), 2);
        assert!(
            body.iter().all(|request| request.confirmation_code.is_none()),
            "codes are for suppliers only"
        );

        Ok(())
    }
}
