//! Product Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::products::records::ProductRecord;

/// Product Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductResponse {
    pub uuid: Uuid,
    pub supplier_uuid: Uuid,
    pub name: String,

    /// Unit price in minor units
    pub price: u64,

    pub stock: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        Self {
            uuid: product.uuid.into_uuid(),
            supplier_uuid: product.supplier_uuid.into_uuid(),
            name: product.name,
            price: product.price,
            stock: product.stock,
            created_at: product.created_at.to_string(),
            updated_at: product.updated_at.to_string(),
        }
    }
}
