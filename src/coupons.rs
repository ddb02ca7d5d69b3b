//! Coupons
//!
//! A coupon belongs to one supplier and only discounts that supplier's goods.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::money::{Amount, MoneyError, percent_of, percent_points};

/// Reasons a coupon cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    /// Coupon has been deactivated.
    #[error("coupon {0} is not active")]
    Inactive(String),

    /// Validity window has not opened yet.
    #[error("coupon {0} is not valid yet")]
    NotStarted(String),

    /// Validity window has closed.
    #[error("coupon {0} has expired")]
    Expired(String),

    /// Global usage cap reached.
    #[error("coupon {0} has reached its usage limit")]
    UsageLimitReached(String),

    /// Per-user usage cap reached.
    #[error("coupon {0} has already been used the maximum number of times by this user")]
    UserLimitReached(String),

    /// Supplier subtotal is below the minimum purchase amount.
    #[error("coupon {code} requires a minimum purchase of {minimum}")]
    BelowMinimumPurchase {
        /// Coupon code.
        code: String,
        /// Minimum purchase amount in minor units.
        minimum: Amount,
    },

    /// None of the goods belong to the coupon's supplier.
    #[error("coupon {0} does not apply to any item in the cart")]
    NotApplicable(String),

    /// Discount could not be computed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Coupon discount rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponDiscount {
    /// Whole percent points off the supplier subtotal.
    PercentageOff { percentage: u16 },

    /// Fixed minor-unit amount off the supplier subtotal.
    FixedAmountOff { amount: Amount },
}

impl CouponDiscount {
    #[must_use]
    pub const fn to_str(&self) -> &'static str {
        match self {
            Self::PercentageOff { .. } => "percentage",
            Self::FixedAmountOff { .. } => "fixed",
        }
    }
}

/// Coupon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub uuid: Uuid,
    pub code: String,
    pub supplier: Uuid,
    pub discount: CouponDiscount,
    pub min_purchase_amount: Amount,
    pub valid_from: Timestamp,
    pub valid_until: Option<Timestamp>,
    pub active: bool,
    pub max_uses: u32,
    pub max_uses_per_user: u32,
    pub uses_count: u32,
}

impl Coupon {
    /// Check every redemption rule for a supplier subtotal.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponError`] rule that fails.
    pub fn validate(
        &self,
        prior_uses_by_user: u32,
        supplier_subtotal: Amount,
        now: Timestamp,
    ) -> Result<(), CouponError> {
        if !self.active {
            return Err(CouponError::Inactive(self.code.clone()));
        }

        if now < self.valid_from {
            return Err(CouponError::NotStarted(self.code.clone()));
        }

        if self.valid_until.is_some_and(|until| now > until) {
            return Err(CouponError::Expired(self.code.clone()));
        }

        if self.uses_count >= self.max_uses {
            return Err(CouponError::UsageLimitReached(self.code.clone()));
        }

        if prior_uses_by_user >= self.max_uses_per_user {
            return Err(CouponError::UserLimitReached(self.code.clone()));
        }

        if supplier_subtotal < self.min_purchase_amount {
            return Err(CouponError::BelowMinimumPurchase {
                code: self.code.clone(),
                minimum: self.min_purchase_amount,
            });
        }

        Ok(())
    }

    /// Discount granted on a supplier subtotal, never exceeding the subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::Money`] if a percentage cannot be computed.
    pub fn discount_for(&self, supplier_subtotal: Amount) -> Result<Amount, CouponError> {
        let discount = match self.discount {
            CouponDiscount::PercentageOff { percentage } => {
                percent_of(&percent_points(percentage), supplier_subtotal)?
            }
            CouponDiscount::FixedAmountOff { amount } => amount,
        };

        Ok(discount.min(supplier_subtotal))
    }
}

/// Coupon together with the redeeming user's prior usage count.
#[derive(Debug, Clone)]
pub struct CouponRedemption {
    pub coupon: Coupon,
    pub prior_uses_by_user: u32,
}
