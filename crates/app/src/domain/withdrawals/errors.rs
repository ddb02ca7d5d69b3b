//! Withdrawals service errors.

use sqlx::Error;
use thiserror::Error;

use souq::{ledger::LedgerError, withdrawals::WithdrawalError};

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum WithdrawalsServiceError {
    #[error("withdrawal not found")]
    NotFound,

    #[error("not permitted to act on this withdrawal")]
    Forbidden,

    #[error("destination must not be empty")]
    MissingDestination,

    #[error(transparent)]
    Withdrawal(#[from] WithdrawalError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for WithdrawalsServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for WithdrawalsServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Authorization,
            Self::MissingDestination => ErrorKind::Validation,
            Self::Withdrawal(error) => error.kind(),
            Self::Ledger(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
