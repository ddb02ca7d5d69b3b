//! Payments service errors.

use sqlx::Error;
use thiserror::Error;

use souq::{ledger::LedgerError, money::Amount};

use crate::{
    domain::checkout::CheckoutServiceError,
    errors::{Classify, ErrorKind, StorageFailure, classify_sql},
};

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("payment not found")]
    NotFound,

    #[error("not permitted to view this payment")]
    Forbidden,

    #[error("webhook signature does not match")]
    InvalidSignature,

    #[error("malformed webhook payload")]
    InvalidPayload(#[source] serde_json::Error),

    /// The captured payment could not be turned into an order.
    #[error(transparent)]
    Checkout(#[from] CheckoutServiceError),

    /// The order priced differently from what the gateway charged.
    #[error("captured {captured} but the order now comes to {assembled}")]
    AmountMismatch { captured: Amount, assembled: Amount },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PaymentsServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for PaymentsServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden | Self::InvalidSignature => ErrorKind::Authorization,
            Self::InvalidPayload(_) => ErrorKind::Validation,
            Self::Checkout(error) => error.kind(),
            Self::AmountMismatch { .. } => ErrorKind::Conflict,
            Self::Ledger(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
