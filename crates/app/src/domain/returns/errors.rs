//! Returns service errors.

use sqlx::Error;
use thiserror::Error;

use souq::{regions::RegionError, returns::ReturnError, routing::RoutingError};

use crate::errors::{Classify, ErrorKind, StorageFailure, classify_sql};

#[derive(Debug, Error)]
pub enum ReturnsServiceError {
    #[error("return request or order line not found")]
    NotFound,

    #[error("not permitted to view this return")]
    Forbidden,

    /// The supplier has no address to receive the goods at.
    #[error("supplier has no return address")]
    NoSupplierAddress,

    #[error(transparent)]
    Return(#[from] ReturnError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ReturnsServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for ReturnsServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Authorization,
            Self::NoSupplierAddress => ErrorKind::Validation,
            Self::Return(error) => error.kind(),
            Self::Routing(error) => error.kind(),
            Self::Region(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
