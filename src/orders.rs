//! Orders
//!
//! An order's status is derived from its outbound legs and never moves backwards, apart from
//! cancellation and the terminal delivery outcomes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shipments::ShipmentStatus;

/// Errors raised by order rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// At least one leg is already in transit or finished.
    #[error("order cannot be cancelled while a shipment is {0}")]
    NotCancellable(ShipmentStatus),

    /// Stored status string is not recognised.
    #[error("unknown order status: {0}")]
    UnknownStatus(String),

    /// Stored payment method string is not recognised.
    #[error("unknown payment method: {0}")]
    UnknownPaymentMethod(String),
}

/// How the buyer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    CreditCard,
    Balance,
}

impl PaymentMethod {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::CreditCard => "credit_card",
            Self::Balance => "balance",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            "credit_card" => Ok(Self::CreditCard),
            "balance" => Ok(Self::Balance),
            other => Err(OrderError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// Aggregate order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    ReadyToShip,
    OnMyWay,
    DeliveredSuccessfully,
    FailedDelivery,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::ReadyToShip => "ready_to_ship",
            Self::OnMyWay => "on_my_way",
            Self::DeliveredSuccessfully => "delivered_successfully",
            Self::FailedDelivery => "failed_delivery",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::DeliveredSuccessfully | Self::FailedDelivery | Self::Cancelled
        )
    }

    const fn progress(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::ReadyToShip => 1,
            Self::OnMyWay => 2,
            Self::DeliveredSuccessfully | Self::FailedDelivery | Self::Cancelled => 3,
        }
    }

    /// Move from the stored status towards a freshly derived one without going backwards.
    #[must_use]
    pub fn advance(self, derived: Self) -> Self {
        if self.is_terminal() {
            return self;
        }

        if derived.is_terminal() || derived.progress() > self.progress() {
            derived
        } else {
            self
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "ready_to_ship" => Ok(Self::ReadyToShip),
            "on_my_way" => Ok(Self::OnMyWay),
            "delivered_successfully" => Ok(Self::DeliveredSuccessfully),
            "failed_delivery" => Ok(Self::FailedDelivery),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// What the order status derivation needs to know about a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegState {
    pub status: ShipmentStatus,
    pub ends_at_warehouse: bool,
}

impl LegState {
    fn is_finished(self) -> bool {
        if self.ends_at_warehouse {
            self.status == ShipmentStatus::DeliveredToWarehouse
        } else {
            matches!(
                self.status,
                ShipmentStatus::DeliveredSuccessfully | ShipmentStatus::FailedDelivery
            )
        }
    }
}

/// Derive an order's status from its outbound legs.
#[must_use]
pub fn derive_status(legs: &[LegState]) -> OrderStatus {
    let active: Vec<LegState> = legs
        .iter()
        .copied()
        .filter(|leg| leg.status != ShipmentStatus::Cancelled)
        .collect();

    if active.is_empty() {
        return if legs.is_empty() {
            OrderStatus::Created
        } else {
            OrderStatus::Cancelled
        };
    }

    if active.iter().all(|leg| leg.is_finished()) {
        return if active
            .iter()
            .any(|leg| leg.status == ShipmentStatus::FailedDelivery)
        {
            OrderStatus::FailedDelivery
        } else {
            OrderStatus::DeliveredSuccessfully
        };
    }

    if active
        .iter()
        .all(|leg| leg.status == ShipmentStatus::OnMyWay || leg.status.is_terminal())
    {
        return OrderStatus::OnMyWay;
    }

    if active.iter().all(|leg| leg.status != ShipmentStatus::Created) {
        return OrderStatus::ReadyToShip;
    }

    OrderStatus::Created
}

/// Check that every leg of an order can still be cancelled.
///
/// # Errors
///
/// Returns [`OrderError::NotCancellable`] naming the first leg status that blocks cancellation.
pub fn ensure_cancellable(legs: &[ShipmentStatus]) -> Result<(), OrderError> {
    match legs
        .iter()
        .find(|status| **status != ShipmentStatus::Cancelled && !status.is_cancellable())
    {
        Some(status) => Err(OrderError::NotCancellable(*status)),
        None => Ok(()),
    }
}
