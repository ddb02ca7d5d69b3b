//! Withdrawal Records

use jiff::Timestamp;

use souq::{
    money::Amount,
    withdrawals::{TransferType, WithdrawStatus},
};

use crate::{domain::users::records::UserUuid, uuids::TypedUuid};

/// Withdrawal UUID
pub type WithdrawalUuid = TypedUuid<WithdrawalRecord>;

/// Withdrawal Record
#[derive(Debug, Clone)]
pub struct WithdrawalRecord {
    pub uuid: WithdrawalUuid,
    pub user_uuid: UserUuid,
    pub amount: Amount,
    pub transfer_type: TransferType,

    /// Account number or wallet the money goes to.
    pub destination: String,
    pub status: WithdrawStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
