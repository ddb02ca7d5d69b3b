//! Products service errors.

use sqlx::Error;
use thiserror::Error;

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("only the owning supplier may manage this product")]
    Forbidden,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ProductsServiceError {
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

impl Classify for ProductsServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists => ErrorKind::Conflict,
            Self::NotFound => ErrorKind::NotFound,
            Self::InvalidReference | Self::MissingRequiredData | Self::InvalidData => {
                ErrorKind::Validation
            }
            Self::Forbidden => ErrorKind::Authorization,
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
