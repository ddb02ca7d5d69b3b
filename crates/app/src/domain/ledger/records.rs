//! Ledger Records

use jiff::Timestamp;
use serde::Serialize;

use souq::{
    ledger::{RelatedObject, TransactionType},
    money::SignedAmount,
};

use crate::{domain::users::records::UserUuid, uuids::TypedUuid};

/// Transaction UUID
pub type TransactionUuid = TypedUuid<TransactionRecord>;

/// Immutable ledger entry.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub uuid: TransactionUuid,
    pub user_uuid: UserUuid,
    pub kind: TransactionType,
    pub amount: SignedAmount,
    pub related: RelatedObject,
    pub created_at: Timestamp,
}

/// A user's current balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub user: uuid::Uuid,
    pub balance: SignedAmount,
}
