//! Orders service errors.

use sqlx::Error;
use thiserror::Error;

use souq::{ledger::LedgerError, orders::OrderError, shipments::ShipmentError};

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("only the buyer may manage this order")]
    Forbidden,

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Shipment(#[from] ShipmentError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for OrdersServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Authorization,
            Self::Order(error) => error.kind(),
            Self::Shipment(error) => error.kind(),
            Self::Ledger(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
