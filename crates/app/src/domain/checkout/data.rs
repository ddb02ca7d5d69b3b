//! Checkout Data

use souq::orders::PaymentMethod;

use crate::domain::{
    orders::records::OrderRecord, payments::records::PaymentRecord, users::records::AddressUuid,
};

/// A customer's checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub address_uuid: AddressUuid,
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
}

/// What a checkout produced.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Cash and balance checkouts create the order straight away.
    Order(OrderRecord),

    /// Card checkouts wait for the payment gateway; the payment UUID is the client reference.
    PaymentPending(PaymentRecord),
}
