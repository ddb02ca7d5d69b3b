//! List Supplier Products Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::into_status_error, extensions::*, products::responses::ProductResponse, state::State,
};

/// List Supplier Products Handler
///
/// Products sold by `supplier`, or by the caller when omitted.
#[endpoint(
    tags("products"),
    summary = "List Supplier Products",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Products listed"),
    ),
)]
pub(crate) async fn handler(
    supplier: QueryParam<Uuid, false>,
    depot: &mut Depot,
) -> Result<Json<Vec<ProductResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let supplier = supplier.into_inner().unwrap_or(actor.user);

    let products = state
        .app
        .products
        .list_supplier_products(supplier.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::products::records::ProductUuid;

    use crate::test_helpers::{SUPPLIER, Mocks, customer, make_product, service_as, supplier};

    use super::*;

    fn route() -> Router {
        Router::with_path("products").get(handler)
    }

    #[tokio::test]
    async fn defaults_to_the_callers_products() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_list_supplier_products()
            .once()
            .withf(|user| user.into_uuid() == SUPPLIER)
            .return_once(|_| Ok(vec![make_product(ProductUuid::new())]));

        let mut res = TestClient::get("http://example.com/products")
            .send(&service_as(supplier(), mocks, route()))
            .await;

        let body: Vec<ProductResponse> = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn customers_browse_a_named_supplier() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_list_supplier_products()
            .once()
            .withf(|user| user.into_uuid() == SUPPLIER)
            .return_once(|_| Ok(Vec::new()));

        let mut res = TestClient::get(format!("http://example.com/products?supplier={SUPPLIER}"))
            .send(&service_as(customer(), mocks, route()))
            .await;

        let body: Vec<ProductResponse> = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.is_empty(), "supplier has no products");

        Ok(())
    }
}
