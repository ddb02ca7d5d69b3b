//! Returns
//!
//! A customer may send back part of a delivered order line. The supplier approves or rejects the
//! request; approved returns travel back through the same leg routing as outbound goods and settle
//! once the supplier confirms receipt.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    actors::{Actor, Role},
    money::Amount,
    orders::OrderStatus,
};

/// Errors raised by return rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReturnError {
    /// Only delivered orders accept returns.
    #[error("order is {0}, only delivered orders can be returned")]
    NotDelivered(OrderStatus),

    /// Requested quantity is zero or exceeds what is still returnable.
    #[error("requested {requested} but only {returnable} can be returned")]
    InvalidQuantity {
        /// Quantity asked for.
        requested: u32,
        /// Quantity still returnable.
        returnable: u32,
    },

    /// Actor may not perform this step.
    #[error("not permitted to {0} this return")]
    Forbidden(&'static str),

    /// The request is not in a state that allows the step.
    #[error("cannot {step} a return that is {status}")]
    InvalidTransition {
        /// Attempted step.
        step: &'static str,
        /// Current status.
        status: ReturnStatus,
    },

    /// Refund value overflowed.
    #[error("return amount overflowed")]
    Overflow,

    /// Stored status string is not recognised.
    #[error("unknown return status: {0}")]
    UnknownStatus(String),
}

/// Return request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Requested,
    Approved,
    Rejected,
    Completed,
    Failed,
}

impl ReturnStatus {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the request still claims part of the purchased quantity.
    #[must_use]
    pub const fn holds_quantity(self) -> bool {
        !matches!(self, Self::Rejected | Self::Failed)
    }

    fn step(self, step: &'static str, from: Self, next: Self) -> Result<Self, ReturnError> {
        if self == from {
            Ok(next)
        } else {
            Err(ReturnError::InvalidTransition { step, status: self })
        }
    }

    /// # Errors
    ///
    /// Returns [`ReturnError::InvalidTransition`] unless the request is `requested`.
    pub fn approve(self) -> Result<Self, ReturnError> {
        self.step("approve", Self::Requested, Self::Approved)
    }

    /// # Errors
    ///
    /// Returns [`ReturnError::InvalidTransition`] unless the request is `requested`.
    pub fn reject(self) -> Result<Self, ReturnError> {
        self.step("reject", Self::Requested, Self::Rejected)
    }

    /// # Errors
    ///
    /// Returns [`ReturnError::InvalidTransition`] unless the request is `approved`.
    pub fn complete(self) -> Result<Self, ReturnError> {
        self.step("complete", Self::Approved, Self::Completed)
    }

    /// # Errors
    ///
    /// Returns [`ReturnError::InvalidTransition`] unless the request is `approved`.
    pub fn fail(self) -> Result<Self, ReturnError> {
        self.step("fail", Self::Approved, Self::Failed)
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for ReturnStatus {
    type Err = ReturnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(Self::Requested),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ReturnError::UnknownStatus(other.to_string())),
        }
    }
}

/// Purchased line a return is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnableLine {
    pub buyer: Uuid,
    pub order_status: OrderStatus,
    pub unit_price: Amount,
    pub purchased: u32,

    /// The line's share of the coupon discount, spread evenly over the purchased units.
    pub discount: Amount,

    /// Quantity held by earlier requests that were not rejected or failed.
    pub already_returned: u32,
}

impl ReturnableLine {
    /// Validate a new request and price it at what the buyer paid for those units.
    ///
    /// The discount is released cumulatively, so returning every unit gives back exactly the
    /// line's discount share no matter how the returns were split.
    ///
    /// # Errors
    ///
    /// - [`ReturnError::Forbidden`]: the actor is not the buyer.
    /// - [`ReturnError::NotDelivered`]: the order has not been delivered.
    /// - [`ReturnError::InvalidQuantity`]: nothing or too much is requested.
    /// - [`ReturnError::Overflow`]: the refund value overflowed.
    pub fn open(&self, actor: &Actor, quantity: u32) -> Result<Amount, ReturnError> {
        if actor.role != Role::Customer || actor.user != self.buyer {
            return Err(ReturnError::Forbidden("open"));
        }

        if self.order_status != OrderStatus::DeliveredSuccessfully {
            return Err(ReturnError::NotDelivered(self.order_status));
        }

        let returnable = self.purchased.saturating_sub(self.already_returned);

        if quantity == 0 || quantity > returnable {
            return Err(ReturnError::InvalidQuantity {
                requested: quantity,
                returnable,
            });
        }

        let gross = self
            .unit_price
            .checked_mul(Amount::from(quantity))
            .ok_or(ReturnError::Overflow)?;

        let released = |units: u32| {
            u128::from(self.discount) * u128::from(units) / u128::from(self.purchased)
        };
        let discount = released(self.already_returned + quantity) - released(self.already_returned);

        Amount::try_from(discount)
            .ok()
            .and_then(|discount| gross.checked_sub(discount))
            .ok_or(ReturnError::Overflow)
    }
}

/// Only the supplier receiving the goods, or an admin, reviews a return.
///
/// # Errors
///
/// Returns [`ReturnError::Forbidden`] for anyone else.
pub fn ensure_reviewer(
    actor: &Actor,
    supplier: Uuid,
    step: &'static str,
) -> Result<(), ReturnError> {
    let is_supplier = actor.role == Role::Supplier && actor.user == supplier;

    if is_supplier || actor.is_admin() {
        Ok(())
    } else {
        Err(ReturnError::Forbidden(step))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn line(buyer: Uuid) -> ReturnableLine {
        ReturnableLine {
            buyer,
            order_status: OrderStatus::DeliveredSuccessfully,
            unit_price: 5_000,
            purchased: 3,
            discount: 0,
            already_returned: 1,
        }
    }

    #[test]
    fn return_is_priced_at_purchase_price() -> TestResult {
        let buyer = Uuid::now_v7();
        let actor = Actor::new(buyer, Role::Customer, None);

        assert_eq!(line(buyer).open(&actor, 2)?, 10_000);

        Ok(())
    }

    #[test]
    fn coupon_discount_comes_off_the_refund() -> TestResult {
        let buyer = Uuid::now_v7();
        let actor = Actor::new(buyer, Role::Customer, None);
        let discounted = ReturnableLine {
            unit_price: 10_000,
            purchased: 1,
            discount: 1_000,
            already_returned: 0,
            ..line(buyer)
        };

        assert_eq!(discounted.open(&actor, 1)?, 9_000);

        Ok(())
    }

    #[test]
    fn split_returns_give_back_the_whole_discount() -> TestResult {
        let buyer = Uuid::now_v7();
        let actor = Actor::new(buyer, Role::Customer, None);
        let mut discounted = ReturnableLine {
            unit_price: 1_000,
            purchased: 3,
            discount: 1_000,
            already_returned: 0,
            ..line(buyer)
        };
        let mut refunded = 0;

        for _ in 0..3 {
            refunded += discounted.open(&actor, 1)?;
            discounted.already_returned += 1;
        }

        assert_eq!(refunded, 3_000 - 1_000);

        Ok(())
    }

    #[test]
    fn cannot_return_more_than_remains() {
        let buyer = Uuid::now_v7();
        let actor = Actor::new(buyer, Role::Customer, None);

        assert_eq!(
            line(buyer).open(&actor, 3),
            Err(ReturnError::InvalidQuantity {
                requested: 3,
                returnable: 2
            })
        );
    }

    #[test]
    fn undelivered_orders_cannot_be_returned() {
        let buyer = Uuid::now_v7();
        let actor = Actor::new(buyer, Role::Customer, None);
        let pending = ReturnableLine {
            order_status: OrderStatus::OnMyWay,
            ..line(buyer)
        };

        assert_eq!(
            pending.open(&actor, 1),
            Err(ReturnError::NotDelivered(OrderStatus::OnMyWay))
        );
    }

    #[test]
    fn only_the_buyer_opens_a_return() {
        let stranger = Actor::new(Uuid::now_v7(), Role::Customer, None);

        assert_eq!(
            line(Uuid::now_v7()).open(&stranger, 1),
            Err(ReturnError::Forbidden("open"))
        );
    }

    #[test]
    fn rejected_requests_release_their_quantity() {
        assert!(ReturnStatus::Approved.holds_quantity());
        assert!(!ReturnStatus::Rejected.holds_quantity());
        assert!(!ReturnStatus::Failed.holds_quantity());
    }

    #[test]
    fn reviewed_request_cannot_be_reviewed_again() {
        assert_eq!(
            ReturnStatus::Rejected.approve(),
            Err(ReturnError::InvalidTransition {
                step: "approve",
                status: ReturnStatus::Rejected,
            })
        );
    }

    #[test]
    fn other_suppliers_cannot_review() {
        let rival = Actor::new(Uuid::now_v7(), Role::Supplier, None);

        assert_eq!(
            ensure_reviewer(&rival, Uuid::now_v7(), "approve"),
            Err(ReturnError::Forbidden("approve"))
        );
    }
}
