//! Open Return Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::returns::data::OpenReturn;

use crate::{
    errors::into_status_error, extensions::*, returns::responses::ReturnResponse, state::State,
};

/// Open Return Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OpenReturnRequest {
    /// Delivered order line being returned
    pub order_item_uuid: Uuid,

    pub quantity: u32,
    pub reason: String,
}

impl From<OpenReturnRequest> for OpenReturn {
    fn from(request: OpenReturnRequest) -> Self {
        OpenReturn {
            order_item_uuid: request.order_item_uuid.into(),
            quantity: request.quantity,
            reason: request.reason,
        }
    }
}

/// Open Return Handler
///
/// The customer asks to send part of a delivered order line back to its supplier.
#[endpoint(
    tags("returns"),
    summary = "Open Return",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Return opened"),
        (status_code = StatusCode::BAD_REQUEST, description = "Quantity exceeds what can be returned"),
        (status_code = StatusCode::NOT_FOUND, description = "Order line not found"),
        (status_code = StatusCode::CONFLICT, description = "Order not delivered"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<OpenReturnRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ReturnResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let request = state
        .app
        .returns
        .open_return(actor, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/returns/{}", request.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(ReturnResponse::for_actor(request, actor)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use souq::returns::{ReturnError, ReturnStatus};
    use souq_app::domain::{
        orders::records::OrderItemUuid,
        returns::{ReturnsServiceError, records::ReturnRequestUuid},
    };

    use crate::test_helpers::{CUSTOMER, Mocks, customer, make_return, service_as};

    use super::*;

    fn route() -> Router {
        Router::with_path("returns").post(handler)
    }

    #[tokio::test]
    async fn opens_a_return_for_the_customer() -> TestResult {
        let uuid = ReturnRequestUuid::new();
        let item = OrderItemUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .returns
            .expect_open_return()
            .once()
            .withf(move |actor, request| {
                actor.user == CUSTOMER
                    && *request
                        == OpenReturn {
                            order_item_uuid: item,
                            quantity: 1,
                            reason: "Wrong size".to_string(),
                        }
            })
            .return_once(move |_, _| Ok(make_return(uuid, ReturnStatus::Requested)));

        let mut res = TestClient::post("http://example.com/returns")
            .json(&json!({
                "order_item_uuid": item.into_uuid(),
                "quantity": 1,
                "reason": "Wrong size",
            }))
            .send(&service_as(customer(), mocks, route()))
            .await;

        let body: ReturnResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/returns/{uuid}").as_str()));
        assert_eq!(body.status, "requested");
        assert_eq!(body.confirmation_code, None, "customer must not see the code");

        Ok(())
    }

    #[tokio::test]
    async fn returning_too_much_returns_400() {
        let mut mocks = Mocks::default();

        mocks.returns.expect_open_return().once().return_once(|_, _| {
            Err(ReturnsServiceError::Return(ReturnError::InvalidQuantity {
                requested: 5,
                returnable: 1,
            }))
        });

        let res = TestClient::post("http://example.com/returns")
            .json(&json!({
                "order_item_uuid": Uuid::now_v7(),
                "quantity": 5,
                "reason": "Changed my mind",
            }))
            .send(&service_as(customer(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}
