//! Remove Cart Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{errors::into_status_error, extensions::*, state::State};

/// Remove Cart Item Handler
#[endpoint(
    tags("carts"),
    summary = "Remove Cart Item",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart item removed"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart item not found"),
    )
)]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    state
        .app
        .carts
        .remove_item(actor.user.into(), item.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;

    use souq_app::domain::carts::CartsServiceError;

    use crate::test_helpers::{CUSTOMER, Mocks, customer, service_as};

    use super::*;

    fn route() -> Router {
        Router::with_path("cart/items/{item}").delete(handler)
    }

    #[tokio::test]
    async fn removes_the_item() {
        let item = Uuid::now_v7();

        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_remove_item()
            .once()
            .withf(move |user, uuid| user.into_uuid() == CUSTOMER && uuid.into_uuid() == item)
            .return_once(|_, _| Ok(()));

        let res = TestClient::delete(format!("http://example.com/cart/items/{item}"))
            .send(&service_as(customer(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn unknown_item_returns_404() {
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_remove_item()
            .once()
            .return_once(|_, _| Err(CartsServiceError::NotFound));

        let res = TestClient::delete(format!("http://example.com/cart/items/{}", Uuid::now_v7()))
            .send(&service_as(customer(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    }
}
