//! Carts service errors.

use sqlx::Error;
use thiserror::Error;

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart item already exists")]
    AlreadyExists,

    #[error("cart or cart item not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CartsServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            StorageFailure::AlreadyExists => Self::AlreadyExists,
            StorageFailure::InvalidReference => Self::InvalidReference,
            StorageFailure::MissingRequiredData => Self::MissingRequiredData,
            StorageFailure::InvalidData => Self::InvalidData,
            StorageFailure::Other => Self::Sql(error),
        }
    }
}

impl Classify for CartsServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists => ErrorKind::Conflict,
            Self::NotFound => ErrorKind::NotFound,
            Self::InvalidReference | Self::MissingRequiredData | Self::InvalidData => {
                ErrorKind::Validation
            }
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
