//! Get Payment Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::into_status_error, extensions::*, payments::responses::PaymentResponse, state::State,
};

/// Get Payment Handler
///
/// Card checkouts poll this until the gateway has reported back.
#[endpoint(
    tags("payments"),
    summary = "Get Payment",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Payment found"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the payer"),
        (status_code = StatusCode::NOT_FOUND, description = "Payment not found"),
    ),
)]
pub(crate) async fn handler(
    payment: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<PaymentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let payment = state
        .app
        .payments
        .get_payment(actor, payment.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(payment.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::{
        orders::records::OrderUuid,
        payments::{
            PaymentsServiceError,
            records::{PaymentRecord, PaymentStatus, PaymentUuid},
        },
    };

    use crate::test_helpers::{CUSTOMER, Mocks, customer, make_payment, service_as, supplier};

    use super::*;

    fn route() -> Router {
        Router::with_path("payments/{payment}").get(handler)
    }

    #[tokio::test]
    async fn returns_the_payment_with_its_order() -> TestResult {
        let uuid = PaymentUuid::new();
        let order = OrderUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .payments
            .expect_get_payment()
            .once()
            .withf(move |actor, payment| actor.user == CUSTOMER && *payment == uuid)
            .return_once(move |_, _| {
                Ok(PaymentRecord {
                    order_uuid: Some(order),
                    ..make_payment(uuid, PaymentStatus::Succeeded)
                })
            });

        let mut res = TestClient::get(format!("http://example.com/payments/{uuid}"))
            .send(&service_as(customer(), mocks, route()))
            .await;

        let body: PaymentResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.client_reference, uuid.into_uuid());
        assert_eq!(body.status, "succeeded");
        assert_eq!(body.order_uuid, Some(order.into_uuid()));

        Ok(())
    }

    #[tokio::test]
    async fn someone_elses_payment_returns_403() {
        let mut mocks = Mocks::default();

        mocks
            .payments
            .expect_get_payment()
            .once()
            .return_once(|_, _| Err(PaymentsServiceError::Forbidden));

        let res = TestClient::get(format!("http://example.com/payments/{}", Uuid::now_v7()))
            .send(&service_as(supplier(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }
}
