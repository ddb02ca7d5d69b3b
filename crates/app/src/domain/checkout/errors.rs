//! Checkout service errors.

use sqlx::Error;
use thiserror::Error;

use souq::{
    coupons::CouponError, ledger::LedgerError, pricing::PricingError, regions::RegionError,
    routing::RoutingError,
};

use crate::{
    domain::products::records::ProductUuid,
    errors::{Classify, ErrorKind, StorageFailure, classify_sql},
};

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error("address not found")]
    NotFound,

    #[error("only customers can check out")]
    Forbidden,

    #[error("address belongs to another user")]
    AddressNotOwned,

    #[error("coupon {0} does not exist")]
    CouponNotFound(String),

    /// The product's supplier has no pickup address.
    #[error("supplier of product {0} has no address")]
    SupplierWithoutAddress(ProductUuid),

    #[error("not enough stock for product {0}")]
    InsufficientStock(ProductUuid),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CheckoutServiceError {
    fn from(error: Error) -> Self {
        match classify_sql(&error) {
            StorageFailure::NotFound => Self::NotFound,
            _ => Self::Sql(error),
        }
    }
}

impl Classify for CheckoutServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound | Self::CouponNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden | Self::AddressNotOwned => ErrorKind::Authorization,
            Self::SupplierWithoutAddress(_) => ErrorKind::Validation,
            Self::InsufficientStock(_) => ErrorKind::Conflict,
            Self::Pricing(error) => error.kind(),
            Self::Coupon(error) => error.kind(),
            Self::Routing(error) => error.kind(),
            Self::Region(error) => error.kind(),
            Self::Ledger(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}
