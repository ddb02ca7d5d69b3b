//! Users service errors.

use sqlx::Error;
use thiserror::Error;

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("user already exists")]
    AlreadyExists,

    #[error("user or address not found")]
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

impl From<Error> for UsersServiceError {
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

impl Classify for UsersServiceError {
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
