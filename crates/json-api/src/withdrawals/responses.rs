//! Withdrawal Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::withdrawals::records::WithdrawalRecord;

/// Withdrawal Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WithdrawalResponse {
    pub uuid: Uuid,
    pub user_uuid: Uuid,

    /// Held amount in minor units
    pub amount: u64,

    /// `bank_transfer` or `mobile_wallet`
    pub transfer_type: String,

    pub destination: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<WithdrawalRecord> for WithdrawalResponse {
    fn from(withdrawal: WithdrawalRecord) -> Self {
        Self {
            uuid: withdrawal.uuid.into_uuid(),
            user_uuid: withdrawal.user_uuid.into_uuid(),
            amount: withdrawal.amount,
            transfer_type: withdrawal.transfer_type.to_str().to_string(),
            destination: withdrawal.destination,
            status: withdrawal.status.to_string(),
            created_at: withdrawal.created_at.to_string(),
            updated_at: withdrawal.updated_at.to_string(),
        }
    }
}
