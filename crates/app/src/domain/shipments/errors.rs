//! Shipments service errors.

use sqlx::Error;
use thiserror::Error;

use souq::{ledger::LedgerError, returns::ReturnError, shipments::ShipmentError};

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum ShipmentsServiceError {
    #[error("shipment not found")]
    NotFound,

    #[error("not permitted to view this shipment")]
    Forbidden,

    /// Only delivery personnel with a serviced region browse open legs.
    #[error("actor has no serviced region")]
    NoServicedRegion,

    #[error(transparent)]
    Shipment(#[from] ShipmentError),

    #[error(transparent)]
    Return(#[from] ReturnError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ShipmentsServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for ShipmentsServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden | Self::NoServicedRegion => ErrorKind::Authorization,
            Self::Shipment(error) => error.kind(),
            Self::Return(error) => error.kind(),
            Self::Ledger(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
