//! Shipment Transition Handlers
//!
//! Every action answers with the leg as it stands after the transition.

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::into_status_error, extensions::*, shipments::responses::ShipmentResponse,
    state::State,
};

/// Mark Ready Handler
///
/// The sending supplier or customer hands the goods over for pickup.
#[endpoint(
    tags("shipments"),
    summary = "Mark Shipment Ready",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Leg ready to ship"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the sender"),
        (status_code = StatusCode::CONFLICT, description = "Leg is not in created state"),
    ),
)]
pub(crate) async fn ready(
    shipment: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ShipmentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let shipment = state
        .app
        .shipments
        .mark_ready(actor, shipment.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(shipment.into()))
}

/// Accept Shipment Handler
///
/// A delivery person claims a ready leg departing from their region. Only one claim wins.
#[endpoint(
    tags("shipments"),
    summary = "Accept Shipment",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Leg claimed"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a delivery person for this region"),
        (status_code = StatusCode::CONFLICT, description = "Already taken"),
    ),
)]
pub(crate) async fn accept(
    shipment: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ShipmentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let shipment = state
        .app
        .shipments
        .accept(actor, shipment.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(shipment.into()))
}

/// Arrive At Warehouse Handler
///
/// The holder drops a first leg at the intermediate warehouse.
#[endpoint(
    tags("shipments"),
    summary = "Deliver Shipment To Warehouse",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Leg delivered to warehouse"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the holder"),
        (status_code = StatusCode::CONFLICT, description = "Leg does not end at a warehouse"),
    ),
)]
pub(crate) async fn arrive(
    shipment: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ShipmentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let shipment = state
        .app
        .shipments
        .arrive_at_warehouse(actor, shipment.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(shipment.into()))
}

/// Confirm Delivery Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ConfirmDeliveryRequest {
    /// Code shown to the recipient
    pub confirmation_code: String,
}

/// Confirm Delivery Handler
///
/// The holder hands the goods to the recipient against their confirmation code.
#[endpoint(
    tags("shipments"),
    summary = "Confirm Delivery",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Leg delivered"),
        (status_code = StatusCode::BAD_REQUEST, description = "Wrong confirmation code"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the holder"),
        (status_code = StatusCode::CONFLICT, description = "Leg is not on its way"),
    ),
)]
pub(crate) async fn deliver(
    shipment: PathParam<Uuid>,
    json: JsonBody<ConfirmDeliveryRequest>,
    depot: &mut Depot,
) -> Result<Json<ShipmentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let shipment = state
        .app
        .shipments
        .confirm_delivery(
            actor,
            shipment.into_inner().into(),
            &json.into_inner().confirmation_code,
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(shipment.into()))
}

/// Fail Delivery Handler
///
/// The holder reports that the recipient could not be reached.
#[endpoint(
    tags("shipments"),
    summary = "Fail Delivery",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Leg marked failed"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the holder"),
        (status_code = StatusCode::CONFLICT, description = "Leg is not on its way"),
    ),
)]
pub(crate) async fn fail(
    shipment: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ShipmentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let shipment = state
        .app
        .shipments
        .fail_delivery(actor, shipment.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(shipment.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use souq::{
        actors::Role,
        shipments::{Action, ShipmentError, ShipmentStatus},
    };
    use souq_app::domain::shipments::{
        ShipmentsServiceError,
        records::{ShipmentRecord, ShipmentUuid},
    };

    use crate::test_helpers::{COURIER, Mocks, courier, make_shipment, service_as, supplier};

    use super::*;

    fn router() -> Router {
        Router::with_path("shipments/{shipment}")
            .push(Router::with_path("ready").post(ready))
            .push(Router::with_path("accept").post(accept))
            .push(Router::with_path("arrive").post(arrive))
            .push(Router::with_path("deliver").post(deliver))
            .push(Router::with_path("fail").post(fail))
    }

    fn held(uuid: ShipmentUuid, status: ShipmentStatus) -> ShipmentRecord {
        ShipmentRecord {
            delivery_person_uuid: Some(COURIER.into()),
            ..make_shipment(uuid, status)
        }
    }

    #[tokio::test]
    async fn supplier_marks_leg_ready() -> TestResult {
        let uuid = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .shipments
            .expect_mark_ready()
            .once()
            .withf(move |actor, shipment| actor.role == Role::Supplier && *shipment == uuid)
            .return_once(move |_, _| Ok(make_shipment(uuid, ShipmentStatus::ReadyToShip)));

        let mut res = TestClient::post(format!("http://example.com/shipments/{uuid}/ready"))
            .send(&service_as(supplier(), mocks, router()))
            .await;

        let body: ShipmentResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status, "ready_to_ship");

        Ok(())
    }

    #[tokio::test]
    async fn second_claim_conflicts() {
        let uuid = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .shipments
            .expect_accept()
            .once()
            .return_once(|_, _| Err(ShipmentsServiceError::Shipment(ShipmentError::AlreadyTaken)));

        let res = TestClient::post(format!("http://example.com/shipments/{uuid}/accept"))
            .send(&service_as(courier(), mocks, router()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
    }

    #[tokio::test]
    async fn accepted_leg_names_its_courier() -> TestResult {
        let uuid = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .shipments
            .expect_accept()
            .once()
            .withf(move |actor, shipment| actor.user == COURIER && *shipment == uuid)
            .return_once(move |_, _| Ok(held(uuid, ShipmentStatus::OnMyWay)));

        let mut res = TestClient::post(format!("http://example.com/shipments/{uuid}/accept"))
            .send(&service_as(courier(), mocks, router()))
            .await;

        let body: ShipmentResponse = res.take_json().await?;

        assert_eq!(body.status, "on_my_way");
        assert_eq!(body.delivery_person_uuid, Some(COURIER));

        Ok(())
    }

    #[tokio::test]
    async fn courier_drops_leg_at_warehouse() -> TestResult {
        let uuid = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .shipments
            .expect_arrive_at_warehouse()
            .once()
            .withf(move |_, shipment| *shipment == uuid)
            .return_once(move |_, _| Ok(held(uuid, ShipmentStatus::DeliveredToWarehouse)));

        let mut res = TestClient::post(format!("http://example.com/shipments/{uuid}/arrive"))
            .send(&service_as(courier(), mocks, router()))
            .await;

        let body: ShipmentResponse = res.take_json().await?;

        assert_eq!(body.status, "delivered_to_warehouse");

        Ok(())
    }

    #[tokio::test]
    async fn delivery_forwards_the_code() -> TestResult {
        let uuid = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .shipments
            .expect_confirm_delivery()
            .once()
            .withf(move |_, shipment, code| *shipment == uuid && code == "123456")
            .return_once(move |_, _, _| Ok(held(uuid, ShipmentStatus::DeliveredSuccessfully)));

        let mut res = TestClient::post(format!("http://example.com/shipments/{uuid}/deliver"))
            .json(&json!({ "confirmation_code": "123456" }))
            .send(&service_as(courier(), mocks, router()))
            .await;

        let body: ShipmentResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status, "delivered_successfully");

        Ok(())
    }

    #[tokio::test]
    async fn wrong_code_returns_400() {
        let uuid = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .shipments
            .expect_confirm_delivery()
            .once()
            .return_once(|_, _, _| {
                Err(ShipmentsServiceError::Shipment(
                    ShipmentError::InvalidConfirmationCode,
                ))
            });

        let res = TestClient::post(format!("http://example.com/shipments/{uuid}/deliver"))
            .json(&json!({ "confirmation_code": "000000" }))
            .send(&service_as(courier(), mocks, router()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn delivery_without_a_code_never_reaches_the_service() {
        let uuid = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks.shipments.expect_confirm_delivery().never();

        let res = TestClient::post(format!("http://example.com/shipments/{uuid}/deliver"))
            .json(&json!({}))
            .send(&service_as(courier(), mocks, router()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn only_the_holder_may_fail_a_leg() {
        let uuid = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks.shipments.expect_fail_delivery().once().return_once(|_, _| {
            Err(ShipmentsServiceError::Shipment(ShipmentError::Forbidden(
                Action::FailDelivery,
            )))
        });

        let res = TestClient::post(format!("http://example.com/shipments/{uuid}/fail"))
            .send(&service_as(supplier(), mocks, router()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }
}
