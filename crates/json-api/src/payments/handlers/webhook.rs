//! Payment Webhook Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use souq_app::domain::payments::{
    PaymentsServiceError, data::WebhookOutcome, signature::SIGNATURE_HEADER,
};

use crate::{
    errors::into_status_error, extensions::*, observability::observe_webhook, state::State,
};

/// Webhook Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WebhookResponse {
    /// `completed`, `already_processed`, `failed` or `refunded`
    pub outcome: String,

    /// Order assembled from the captured payment
    pub order_uuid: Option<Uuid>,
}

impl From<WebhookOutcome> for WebhookResponse {
    fn from(outcome: WebhookOutcome) -> Self {
        match outcome {
            WebhookOutcome::Completed(order) => Self {
                outcome: "completed".to_string(),
                order_uuid: Some(order.uuid.into_uuid()),
            },
            WebhookOutcome::AlreadyProcessed => Self {
                outcome: "already_processed".to_string(),
                order_uuid: None,
            },
            WebhookOutcome::Failed => Self {
                outcome: "failed".to_string(),
                order_uuid: None,
            },
            WebhookOutcome::Refunded => Self {
                outcome: "refunded".to_string(),
                order_uuid: None,
            },
        }
    }
}

/// Payment Webhook Handler
///
/// Called by the payment gateway, authenticated by an HMAC signature over the raw body rather
/// than a bearer token. Redeliveries of an event already acted on are acknowledged unchanged.
#[endpoint(
    tags("payments"),
    summary = "Payment Webhook",
    responses(
        (status_code = StatusCode::OK, description = "Event processed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Malformed event"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Signature missing or invalid"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown client reference"),
        (status_code = StatusCode::CONFLICT, description = "Order refused, payment refunded to balance"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<WebhookResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let payload = req
        .payload()
        .await
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    match state.app.payments.handle_webhook(payload, &signature).await {
        Ok(outcome) => {
            let response = WebhookResponse::from(outcome);

            observe_webhook(&response.outcome);

            Ok(Json(response))
        }
        Err(PaymentsServiceError::InvalidSignature) => {
            observe_webhook("rejected");
            warn!("payment webhook signature rejected");

            Err(StatusError::unauthorized().brief("Invalid webhook signature"))
        }
        Err(error) => {
            observe_webhook("error");

            Err(into_status_error(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::{orders::records::OrderUuid, payments::signature::sign};

    use crate::test_helpers::{Mocks, anonymous_service, make_order};

    use super::*;

    const SECRET: &[u8] = b"whsec_test";

    fn route() -> Router {
        Router::with_path("payments/webhook").post(handler)
    }

    fn event(kind: &str, reference: Uuid) -> String {
        format!(r#"{{"type":"{kind}","client_reference":"{reference}","provider_reference":"ch_1"}}"#)
    }

    #[tokio::test]
    async fn captured_payments_report_their_order() -> TestResult {
        let order = OrderUuid::new();
        let body = event("payment.succeeded", Uuid::now_v7());
        let signature = sign(SECRET, body.as_bytes());

        let mut mocks = Mocks::default();

        let expected_body = body.clone();
        let expected_signature = signature.clone();

        mocks
            .payments
            .expect_handle_webhook()
            .once()
            .withf(move |payload, header| {
                payload == expected_body.as_bytes() && header == expected_signature
            })
            .return_once(move |_, _| Ok(WebhookOutcome::Completed(make_order(order))));

        let mut res = TestClient::post("http://example.com/payments/webhook")
            .add_header(SIGNATURE_HEADER, signature, true)
            .body(body)
            .send(&anonymous_service(mocks, route()))
            .await;

        let response: WebhookResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(response.outcome, "completed");
        assert_eq!(response.order_uuid, Some(order.into_uuid()));

        Ok(())
    }

    #[tokio::test]
    async fn redeliveries_are_acknowledged() -> TestResult {
        let body = event("payment.failed", Uuid::now_v7());
        let signature = sign(SECRET, body.as_bytes());

        let mut mocks = Mocks::default();

        mocks
            .payments
            .expect_handle_webhook()
            .once()
            .return_once(|_, _| Ok(WebhookOutcome::AlreadyProcessed));

        let mut res = TestClient::post("http://example.com/payments/webhook")
            .add_header(SIGNATURE_HEADER, signature, true)
            .body(body)
            .send(&anonymous_service(mocks, route()))
            .await;

        let response: WebhookResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(response.outcome, "already_processed");
        assert_eq!(response.order_uuid, None);

        Ok(())
    }

    #[tokio::test]
    async fn late_captures_report_the_refund() -> TestResult {
        let body = event("payment.succeeded", Uuid::now_v7());
        let signature = sign(SECRET, body.as_bytes());

        let mut mocks = Mocks::default();

        mocks
            .payments
            .expect_handle_webhook()
            .once()
            .return_once(|_, _| Ok(WebhookOutcome::Refunded));

        let mut res = TestClient::post("http://example.com/payments/webhook")
            .add_header(SIGNATURE_HEADER, signature, true)
            .body(body)
            .send(&anonymous_service(mocks, route()))
            .await;

        let response: WebhookResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(response.outcome, "refunded");
        assert_eq!(response.order_uuid, None);

        Ok(())
    }

    #[tokio::test]
    async fn repriced_captures_return_409() {
        let mut mocks = Mocks::default();

        mocks
            .payments
            .expect_handle_webhook()
            .once()
            .return_once(|_, _| {
                Err(PaymentsServiceError::AmountMismatch {
                    captured: 13_000,
                    assembled: 14_000,
                })
            });

        let body = event("payment.succeeded", Uuid::now_v7());

        let res = TestClient::post("http://example.com/payments/webhook")
            .add_header(SIGNATURE_HEADER, sign(SECRET, body.as_bytes()), true)
            .body(body)
            .send(&anonymous_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
    }

    #[tokio::test]
    async fn missing_signature_returns_401() {
        let mut mocks = Mocks::default();

        mocks
            .payments
            .expect_handle_webhook()
            .once()
            .withf(|_, header| header.is_empty())
            .return_once(|_, _| Err(PaymentsServiceError::InvalidSignature));

        let res = TestClient::post("http://example.com/payments/webhook")
            .body(event("payment.succeeded", Uuid::now_v7()))
            .send(&anonymous_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn unknown_payments_return_404() {
        let mut mocks = Mocks::default();

        mocks
            .payments
            .expect_handle_webhook()
            .once()
            .return_once(|_, _| Err(PaymentsServiceError::NotFound));

        let body = event("payment.succeeded", Uuid::now_v7());

        let res = TestClient::post("http://example.com/payments/webhook")
            .add_header(SIGNATURE_HEADER, sign(SECRET, body.as_bytes()), true)
            .body(body)
            .send(&anonymous_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    }
}
