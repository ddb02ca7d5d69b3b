//! Return Request Records

use jiff::Timestamp;

use souq::{money::Amount, returns::ReturnStatus, shipments::ConfirmationCode};

use crate::{
    domain::{
        orders::records::{OrderItemUuid, OrderUuid},
        products::records::ProductUuid,
        shipments::records::ShipmentRecord,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Return Request UUID
pub type ReturnRequestUuid = TypedUuid<ReturnRequestRecord>;

/// Return Request Record
#[derive(Debug, Clone)]
pub struct ReturnRequestRecord {
    pub uuid: ReturnRequestUuid,
    pub order_item_uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub product_uuid: ProductUuid,
    pub customer_uuid: UserUuid,
    pub supplier_uuid: UserUuid,
    pub quantity: u32,

    /// Refund value at the purchase-time unit price.
    pub amount: Amount,
    pub reason: String,
    pub status: ReturnStatus,

    /// Handed over by the supplier when the goods arrive back.
    pub confirmation_code: ConfirmationCode,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A return with its legs.
#[derive(Debug, Clone)]
pub struct ReturnDetails {
    pub request: ReturnRequestRecord,
    pub shipments: Vec<ShipmentRecord>,
}
