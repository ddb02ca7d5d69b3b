//! Update Product Handler

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

use souq_app::domain::products::data::ProductUpdate;

use crate::{
    errors::into_status_error, extensions::*, products::responses::ProductResponse, state::State,
};

/// Update Product Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateProductRequest {
    pub price: u64,
    pub stock: u64,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(request: UpdateProductRequest) -> Self {
        ProductUpdate {
            price: request.price,
            stock: request.stock,
        }
    }
}

/// Update Product Handler
///
/// Changes price and stock. Orders already placed keep the price they were bought at.
#[endpoint(
    tags("products"),
    summary = "Update Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Product updated"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the supplier"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    json: JsonBody<UpdateProductRequest>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let product = state
        .app
        .products
        .update_product(actor, product.into_inner().into(), json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(product.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use souq_app::domain::products::{
        ProductsServiceError,
        records::{ProductRecord, ProductUuid},
    };

    use crate::test_helpers::{Mocks, make_product, service_as, supplier};

    use super::*;

    fn route() -> Router {
        Router::with_path("products/{product}").put(handler)
    }

    #[tokio::test]
    async fn updates_price_and_stock() -> TestResult {
        let uuid = ProductUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_update_product()
            .once()
            .withf(move |_, product, update| {
                *product == uuid
                    && *update
                        == ProductUpdate {
                            price: 4_500,
                            stock: 3,
                        }
            })
            .return_once(move |_, _, update| {
                Ok(ProductRecord {
                    price: update.price,
                    stock: update.stock,
                    ..make_product(uuid)
                })
            });

        let mut res = TestClient::put(format!("http://example.com/products/{uuid}"))
            .json(&json!({ "price": 4_500, "stock": 3 }))
            .send(&service_as(supplier(), mocks, route()))
            .await;

        let body: ProductResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.price, 4_500);
        assert_eq!(body.stock, 3);

        Ok(())
    }

    #[tokio::test]
    async fn other_suppliers_get_403() {
        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_update_product()
            .once()
            .return_once(|_, _, _| Err(ProductsServiceError::Forbidden));

        let res = TestClient::put(format!("http://example.com/products/{}", Uuid::now_v7()))
            .json(&json!({ "price": 1, "stock": 1 }))
            .send(&service_as(supplier(), mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }
}
