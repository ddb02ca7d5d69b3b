//! Return Request Data

use souq::{money::Amount, shipments::ConfirmationCode};

use crate::domain::{
    orders::records::OrderItemUuid, returns::records::ReturnRequestUuid, users::records::UserUuid,
};

/// New Return Request Data
#[derive(Debug, Clone)]
pub struct NewReturnRequest {
    pub uuid: ReturnRequestUuid,
    pub order_item_uuid: OrderItemUuid,
    pub customer_uuid: UserUuid,
    pub supplier_uuid: UserUuid,
    pub quantity: u32,
    pub amount: Amount,
    pub reason: String,
    pub confirmation_code: ConfirmationCode,
}

/// A customer's request to send back part of an order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReturn {
    pub order_item_uuid: OrderItemUuid,
    pub quantity: u32,
    pub reason: String,
}
