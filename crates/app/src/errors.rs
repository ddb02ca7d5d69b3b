//! Error classification shared by every service.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as DbErrorKind},
};

use souq::{
    coupons::CouponError, ledger::LedgerError, orders::OrderError, pricing::PricingError,
    regions::RegionError, returns::ReturnError, routing::RoutingError, shipments::ShipmentError,
    withdrawals::WithdrawalError,
};

/// Caller-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape.
    Validation,

    /// Missing order, shipment, warehouse, coupon, ...
    NotFound,

    /// Insufficient stock or balance, exhausted coupon, claimed shipment, wrong state.
    Conflict,

    /// Actor not permitted for this action on this object.
    Authorization,

    /// Storage or infrastructure failure.
    Internal,
}

/// Errors that know their category.
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

/// Storage failure categories derived from database error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StorageFailure {
    NotFound,
    AlreadyExists,
    InvalidReference,
    MissingRequiredData,
    InvalidData,
    Other,
}

pub(crate) fn classify_sql(error: &Error) -> StorageFailure {
    if matches!(error, Error::RowNotFound) {
        return StorageFailure::NotFound;
    }

    match error.as_database_error().map(DatabaseError::kind) {
        Some(DbErrorKind::UniqueViolation) => StorageFailure::AlreadyExists,
        Some(DbErrorKind::ForeignKeyViolation) => StorageFailure::InvalidReference,
        Some(DbErrorKind::NotNullViolation) => StorageFailure::MissingRequiredData,
        Some(DbErrorKind::CheckViolation) => StorageFailure::InvalidData,
        Some(DbErrorKind::Other | _) | None => StorageFailure::Other,
    }
}

impl Classify for RegionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidSeed(_) | Self::Duplicate(_) => ErrorKind::Validation,
        }
    }
}

impl Classify for CouponError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Money(_) => ErrorKind::Internal,
            _ => ErrorKind::Conflict,
        }
    }
}

impl Classify for RoutingError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Region(error) => error.kind(),
            Self::Overflow => ErrorKind::Validation,
        }
    }
}

impl Classify for PricingError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCart | Self::InvalidQuantity(_) | Self::Overflow => ErrorKind::Validation,
            Self::Coupon(error) => error.kind(),
            Self::Region(error) => error.kind(),
        }
    }
}

impl Classify for ShipmentError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Forbidden(_) | Self::RegionMismatch { .. } => ErrorKind::Authorization,
            Self::InvalidTransition { .. } | Self::AlreadyTaken => ErrorKind::Conflict,
            Self::InvalidConfirmationCode => ErrorKind::Validation,
            Self::UnknownStatus(_) => ErrorKind::Internal,
        }
    }
}

impl Classify for OrderError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotCancellable(_) => ErrorKind::Conflict,
            Self::UnknownStatus(_) | Self::UnknownPaymentMethod(_) => ErrorKind::Internal,
        }
    }
}

impl Classify for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientBalance { .. } => ErrorKind::Conflict,
            Self::UnknownType(_) | Self::UnknownRelatedKind(_) | Self::Money(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl Classify for ReturnError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuantity { .. } | Self::Overflow => ErrorKind::Validation,
            Self::NotDelivered(_) | Self::InvalidTransition { .. } => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Authorization,
            Self::UnknownStatus(_) => ErrorKind::Internal,
        }
    }
}

impl Classify for WithdrawalError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount => ErrorKind::Validation,
            Self::InsufficientBalance(error) => error.kind(),
            Self::InvalidTransition { .. } => ErrorKind::Conflict,
            Self::UnknownStatus(_) | Self::UnknownTransferType(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use souq::{money::MoneyError, regions::Region, shipments::Action};

    use super::*;

    #[test]
    fn row_not_found_is_not_found() {
        assert_eq!(classify_sql(&Error::RowNotFound), StorageFailure::NotFound);
        assert_eq!(classify_sql(&Error::PoolTimedOut), StorageFailure::Other);
    }

    #[test]
    fn core_errors_map_to_caller_categories() {
        assert_eq!(
            PricingError::Region(RegionError::NotFound(Region::new("aswan"))).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            PricingError::Coupon(CouponError::Expired("X".to_string())).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ShipmentError::AlreadyTaken.kind(), ErrorKind::Conflict);
        assert_eq!(
            ShipmentError::Forbidden(Action::Accept).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            LedgerError::Money(MoneyError::Overflow).kind(),
            ErrorKind::Internal
        );
    }
}
