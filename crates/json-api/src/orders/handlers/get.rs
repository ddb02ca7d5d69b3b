//! Get Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::into_status_error, extensions::*, orders::responses::OrderDetailsResponse,
    state::State,
};

/// Get Order Handler
///
/// An order with its items and shipment legs.
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order found"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the buyer"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderDetailsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let details = state
        .app
        .orders
        .get_order(actor, order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(details.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq::shipments::ShipmentStatus;
    use souq_app::domain::{
        orders::{
            OrdersServiceError,
            records::{OrderDetails, OrderUuid},
        },
        shipments::records::ShipmentUuid,
    };

    use crate::test_helpers::{
        Mocks, customer, make_order, make_shipment, service_as, supplier,
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("orders/{order}").get(handler)
    }

    #[tokio::test]
    async fn returns_order_with_legs() -> TestResult {
        let uuid = OrderUuid::new();
        let leg = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_get_order()
            .once()
            .withf(move |_, order| *order == uuid)
            .return_once(move |_, _| {
                Ok(OrderDetails {
                    order: make_order(uuid),
                    items: Vec::new(),
                    shipments: vec![make_shipment(leg, ShipmentStatus::Created)],
                })
            });

        let mut res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&service_as(customer(), mocks, route()))
            .await;

        let body: OrderDetailsResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.order.uuid, uuid.into_uuid());
        assert_eq!(body.order.status, "created");
        assert_eq!(body.order.totals.final_amount, 13_000);
        assert_eq!(
            body.shipments.first().map(|s| s.uuid),
            Some(leg.into_uuid())
        );

        Ok(())
    }

    #[tokio::test]
    async fn strangers_get_403() {
        let uuid = OrderUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_get_order()
            .once()
            .return_once(|_, _| Err(OrdersServiceError::Forbidden));

        let res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&service_as(supplier(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn malformed_uuid_never_reaches_the_service() {
        let mut mocks = Mocks::default();

        mocks.orders.expect_get_order().never();

        let res = TestClient::get("http://example.com/orders/not-a-uuid")
            .send(&service_as(customer(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}
