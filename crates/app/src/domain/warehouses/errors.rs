//! Warehouses service errors.

use sqlx::Error;
use thiserror::Error;

use souq::regions::RegionError;

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum WarehousesServiceError {
    #[error("warehouse not found")]
    NotFound,

    #[error("invalid warehouse data")]
    InvalidData,

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for WarehousesServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            StorageFailure::InvalidData | StorageFailure::MissingRequiredData => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for WarehousesServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::InvalidData => ErrorKind::Validation,
            Self::Region(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
