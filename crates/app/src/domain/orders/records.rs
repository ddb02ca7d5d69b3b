//! Order Records

use jiff::Timestamp;
use uuid::Uuid;

use souq::{
    money::Amount,
    orders::{OrderStatus, PaymentMethod},
    pricing::Totals,
    regions::Region,
    shipments::ConfirmationCode,
};

use crate::{
    domain::{
        products::records::ProductUuid,
        shipments::records::ShipmentRecord,
        users::records::{AddressUuid, UserUuid},
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Record
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub address_uuid: AddressUuid,
    pub destination_region: Region,
    pub destination_address: String,
    pub payment_method: PaymentMethod,
    pub paid: bool,
    pub status: OrderStatus,
    pub totals: Totals,
    pub coupon_uuid: Option<Uuid>,
    pub confirmation_code: ConfirmationCode,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItemRecord>;

/// Order Item Record
#[derive(Debug, Clone)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub product_uuid: ProductUuid,
    pub supplier_uuid: UserUuid,
    pub quantity: u32,

    /// Price at purchase time.
    pub unit_price: Amount,

    /// Share of the supplier group's coupon discount.
    pub discount: Amount,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// An order with its lines and legs.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
    pub shipments: Vec<ShipmentRecord>,
}
