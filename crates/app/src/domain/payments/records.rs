//! Payment Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use souq::money::Amount;

use crate::{
    domain::{
        orders::records::OrderUuid,
        users::records::{AddressUuid, UserUuid},
    },
    uuids::TypedUuid,
};

/// Payment UUID, also the client reference handed to the gateway.
pub type PaymentUuid = TypedUuid<PaymentRecord>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payment status: {0}")]
pub struct UnknownPaymentStatus(pub String);

/// Card payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Expired,
}

impl PaymentStatus {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownPaymentStatus(other.to_string())),
        }
    }
}

/// Payment Record
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub uuid: PaymentUuid,
    pub user_uuid: UserUuid,
    pub address_uuid: AddressUuid,
    pub coupon_code: Option<String>,

    /// Quoted final amount at checkout.
    pub amount: Amount,
    pub status: PaymentStatus,
    pub provider_reference: Option<String>,

    /// Set once the order has been assembled.
    pub order_uuid: Option<OrderUuid>,

    /// Set when captured money was returned to the buyer's balance instead.
    pub refunded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
