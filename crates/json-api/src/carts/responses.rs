//! Cart Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::carts::records::{CartItemRecord, CartRecord};

/// Cart Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartItemResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
    pub created_at: String,
}

impl From<CartItemRecord> for CartItemResponse {
    fn from(item: CartItemRecord) -> Self {
        Self {
            uuid: item.uuid.into_uuid(),
            product_uuid: item.product_uuid.into_uuid(),
            quantity: item.quantity,
            color: item.color,
            size: item.size,
            created_at: item.created_at.to_string(),
        }
    }
}

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    pub uuid: Uuid,
    pub user_uuid: Uuid,

    /// Items in the order they were added
    pub items: Vec<CartItemResponse>,

    pub created_at: String,
}

impl From<CartRecord> for CartResponse {
    fn from(cart: CartRecord) -> Self {
        Self {
            uuid: cart.uuid.into_uuid(),
            user_uuid: cart.user_uuid.into_uuid(),
            items: cart.items.into_iter().map(Into::into).collect(),
            created_at: cart.created_at.to_string(),
        }
    }
}
