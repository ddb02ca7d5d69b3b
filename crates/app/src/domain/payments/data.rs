//! Payment Data

use serde::Deserialize;
use uuid::Uuid;

use souq::money::Amount;

use crate::domain::{
    orders::records::OrderRecord,
    payments::records::PaymentUuid,
    users::records::{AddressUuid, UserUuid},
};

/// New Payment Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub uuid: PaymentUuid,
    pub user_uuid: UserUuid,
    pub address_uuid: AddressUuid,
    pub coupon_code: Option<String>,
    pub amount: Amount,
}

/// Gateway event kinds we act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PaymentEventType {
    #[serde(rename = "payment.succeeded")]
    Succeeded,

    #[serde(rename = "payment.failed")]
    Failed,
}

/// Body of a gateway webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentEvent {
    #[serde(rename = "type")]
    pub kind: PaymentEventType,

    /// Our payment UUID.
    pub client_reference: Uuid,

    #[serde(default)]
    pub provider_reference: Option<String>,
}

/// What a webhook delivery did.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// Payment captured and the order assembled.
    Completed(OrderRecord),

    /// Payment had already left `pending`; nothing changed.
    AlreadyProcessed,

    /// Payment marked failed.
    Failed,

    /// Captured after the payment had failed or expired; the amount went to the buyer's balance.
    Refunded,
}

/// Totals from one stale sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub payments_expired: usize,
}
