//! Order Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq::pricing::Totals;
use souq_app::domain::orders::records::{OrderDetails, OrderItemRecord, OrderRecord};

use crate::shipments::responses::ShipmentResponse;

/// Order totals in minor units
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TotalsResponse {
    pub subtotal: u64,
    pub discount: u64,
    pub delivery_fee: u64,

    /// `subtotal - discount + delivery_fee`
    pub final_amount: u64,
}

impl From<Totals> for TotalsResponse {
    fn from(totals: Totals) -> Self {
        Self {
            subtotal: totals.subtotal,
            discount: totals.discount,
            delivery_fee: totals.delivery_fee,
            final_amount: totals.final_amount,
        }
    }
}

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,
    pub user_uuid: Uuid,
    pub destination_region: String,
    pub destination_address: String,
    pub payment_method: String,
    pub paid: bool,
    pub status: String,
    pub totals: TotalsResponse,
    pub coupon_uuid: Option<Uuid>,

    /// Code the buyer hands to the courier on final delivery
    pub confirmation_code: String,

    pub created_at: String,
    pub updated_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            user_uuid: order.user_uuid.into_uuid(),
            destination_region: order.destination_region.to_string(),
            destination_address: order.destination_address,
            payment_method: order.payment_method.to_string(),
            paid: order.paid,
            status: order.status.to_string(),
            totals: order.totals.into(),
            coupon_uuid: order.coupon_uuid,
            confirmation_code: order.confirmation_code.as_str().to_string(),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

/// Order Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub supplier_uuid: Uuid,
    pub quantity: u32,

    /// Price per unit at the time of purchase
    pub unit_price: u64,

    /// Coupon discount applied to this line
    pub discount: u64,

    pub color: Option<String>,
    pub size: Option<String>,
}

impl From<OrderItemRecord> for OrderItemResponse {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            uuid: item.uuid.into_uuid(),
            product_uuid: item.product_uuid.into_uuid(),
            supplier_uuid: item.supplier_uuid.into_uuid(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            discount: item.discount,
            color: item.color,
            size: item.size,
        }
    }
}

/// Order Details Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderDetailsResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
    pub shipments: Vec<ShipmentResponse>,
}

impl From<OrderDetails> for OrderDetailsResponse {
    fn from(details: OrderDetails) -> Self {
        Self {
            order: details.order.into(),
            items: details.items.into_iter().map(Into::into).collect(),
            shipments: details.shipments.into_iter().map(Into::into).collect(),
        }
    }
}
