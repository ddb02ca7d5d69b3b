//! Order Data

use uuid::Uuid;

use souq::{
    money::Amount,
    orders::{OrderStatus, PaymentMethod},
    pricing::Totals,
    regions::Region,
    shipments::ConfirmationCode,
};

use crate::domain::{
    orders::records::{OrderItemUuid, OrderUuid},
    products::records::ProductUuid,
    users::records::{AddressUuid, UserUuid},
};

/// New Order Data
#[derive(Debug, Clone)]
pub struct NewOrder {
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
}

/// New Order Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub product_uuid: ProductUuid,
    pub supplier_uuid: UserUuid,
    pub quantity: u32,
    pub unit_price: Amount,
    pub discount: Amount,
    pub color: Option<String>,
    pub size: Option<String>,
}
