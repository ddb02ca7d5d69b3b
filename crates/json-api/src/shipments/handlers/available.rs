//! Available Shipments Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    errors::into_status_error, extensions::*, shipments::responses::ShipmentResponse,
    state::State,
};

/// Available Shipments Handler
///
/// Unclaimed ready legs departing from the delivery person's serviced region.
#[endpoint(
    tags("shipments"),
    summary = "List Available Shipments",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Legs ready for pickup"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a delivery person"),
    ),
)]
pub(crate) async fn handler(
    depot: &mut Depot,
) -> Result<Json<Vec<ShipmentResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let shipments = state
        .app
        .shipments
        .list_available(actor)
        .await
        .map_err(into_status_error)?;

    Ok(Json(shipments.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq::shipments::ShipmentStatus;
    use souq_app::domain::shipments::{ShipmentsServiceError, records::ShipmentUuid};

    use crate::test_helpers::{COURIER, Mocks, courier, customer, make_shipment, service_as};

    use super::*;

    fn route() -> Router {
        Router::with_path("shipments/available").get(handler)
    }

    #[tokio::test]
    async fn couriers_see_ready_legs_from_their_region() -> TestResult {
        let leg = ShipmentUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .shipments
            .expect_list_available()
            .once()
            .withf(|actor| actor.user == COURIER)
            .return_once(move |_| Ok(vec![make_shipment(leg, ShipmentStatus::ReadyToShip)]));

        let mut res = TestClient::get("http://example.com/shipments/available")
            .send(&service_as(courier(), mocks, route()))
            .await;

        let body: Vec<ShipmentResponse> = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.len(), 1);
        assert_eq!(body.first().map(|s| s.from.region.as_str()), Some("giza"));
        assert_eq!(
            body.first().map(|s| s.status.as_str()),
            Some("ready_to_ship")
        );

        Ok(())
    }

    #[tokio::test]
    async fn actors_without_a_region_get_403() {
        let mut mocks = Mocks::default();

        mocks
            .shipments
            .expect_list_available()
            .once()
            .return_once(|_| Err(ShipmentsServiceError::NoServicedRegion));

        let res = TestClient::get("http://example.com/shipments/available")
            .send(&service_as(customer(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }
}
