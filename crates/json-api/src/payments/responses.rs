//! Payment Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::payments::records::PaymentRecord;

/// Payment Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaymentResponse {
    pub uuid: Uuid,

    /// Reference to hand to the payment gateway
    pub client_reference: Uuid,

    pub user_uuid: Uuid,
    pub address_uuid: Uuid,
    pub coupon_code: Option<String>,

    /// Amount to charge in minor units
    pub amount: u64,

    pub status: String,
    pub provider_reference: Option<String>,

    /// Set once the payment has been captured and the order assembled
    pub order_uuid: Option<Uuid>,

    /// Set when the captured amount was credited back to the buyer's balance
    pub refunded_at: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(payment: PaymentRecord) -> Self {
        Self {
            uuid: payment.uuid.into_uuid(),
            client_reference: payment.uuid.into_uuid(),
            user_uuid: payment.user_uuid.into_uuid(),
            address_uuid: payment.address_uuid.into_uuid(),
            coupon_code: payment.coupon_code,
            amount: payment.amount,
            status: payment.status.to_string(),
            provider_reference: payment.provider_reference,
            order_uuid: payment.order_uuid.map(|order| order.into_uuid()),
            refunded_at: payment.refunded_at.map(|at| at.to_string()),
            created_at: payment.created_at.to_string(),
            updated_at: payment.updated_at.to_string(),
        }
    }
}
