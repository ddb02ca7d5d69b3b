//! Coupons service errors.

use sqlx::Error;
use thiserror::Error;

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error("coupon code already exists")]
    AlreadyExists,

    #[error("coupon not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("only the issuing supplier may create this coupon")]
    Forbidden,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CouponsServiceError {
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

impl Classify for CouponsServiceError {
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
