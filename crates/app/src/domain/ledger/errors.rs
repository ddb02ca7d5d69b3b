//! Ledger service errors.

use sqlx::Error;
use thiserror::Error;

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum LedgerServiceError {
    #[error("user not found")]
    NotFound,

    #[error("only the account owner may view this ledger")]
    Forbidden,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for LedgerServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for LedgerServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Authorization,
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
