//! Auth service errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    auth::ApiTokenError,
    errors::{Classify, ErrorKind, StorageFailure, classify_sql},
};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("token not found")]
    NotFound,

    #[error("user not found")]
    UnknownUser,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("token processing error")]
    Token(#[from] ApiTokenError),
}

impl From<Error> for AuthServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            StorageFailure::InvalidReference => Self::UnknownUser,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for AuthServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound | Self::Token(_) => ErrorKind::Authorization,
            Self::UnknownUser => ErrorKind::NotFound,
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
