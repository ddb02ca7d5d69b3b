//! Withdrawal Data

use souq::{
    money::Amount,
    withdrawals::{TransferType, WithdrawStatus},
};

use crate::domain::{users::records::UserUuid, withdrawals::records::WithdrawalUuid};

/// A user's request to move balance out of the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub amount: Amount,
    pub transfer_type: TransferType,
    pub destination: String,
}

/// New Withdrawal Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub uuid: WithdrawalUuid,
    pub user_uuid: UserUuid,
    pub amount: Amount,
    pub transfer_type: TransferType,
    pub destination: String,
    pub status: WithdrawStatus,
}
