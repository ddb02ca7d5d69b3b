//! Withdrawals
//!
//! A withdrawal debits the balance as soon as it is requested. Requests above the review threshold
//! wait for an administrator; smaller ones are approved straight away. Approved requests are
//! claimed by a processor and completed once the transfer has gone out. Rejecting a request gives
//! the held amount back.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ledger::{LedgerError, ensure_covers},
    money::{Amount, SignedAmount},
};

/// Errors raised by the withdrawal workflow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WithdrawalError {
    /// Requested amount is zero.
    #[error("withdrawal amount must be positive")]
    InvalidAmount,

    /// Balance does not cover the request.
    #[error(transparent)]
    InsufficientBalance(#[from] LedgerError),

    /// The request is not in a state that allows the step.
    #[error("cannot {step} a withdrawal that is {status}")]
    InvalidTransition {
        /// Attempted step.
        step: &'static str,
        /// Current status.
        status: WithdrawStatus,
    },

    /// Stored status string is not recognised.
    #[error("unknown withdrawal status: {0}")]
    UnknownStatus(String),

    /// Stored transfer type string is not recognised.
    #[error("unknown transfer type: {0}")]
    UnknownTransferType(String),
}

/// Withdrawal request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawStatus {
    Created,
    AwaitingApproval,
    Approved,
    Rejected,
    Processing,
    Completed,
}

impl WithdrawStatus {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }

    fn step(
        self,
        step: &'static str,
        allowed: &[Self],
        next: Self,
    ) -> Result<Self, WithdrawalError> {
        if allowed.contains(&self) {
            Ok(next)
        } else {
            Err(WithdrawalError::InvalidTransition { step, status: self })
        }
    }

    /// Route a freshly created request to review or straight to approval.
    ///
    /// # Errors
    ///
    /// Returns [`WithdrawalError::InvalidTransition`] unless the request is `created`.
    pub fn assess(self, amount: Amount, review_threshold: Amount) -> Result<Self, WithdrawalError> {
        let next = if amount > review_threshold {
            Self::AwaitingApproval
        } else {
            Self::Approved
        };

        self.step("assess", &[Self::Created], next)
    }

    /// # Errors
    ///
    /// Returns [`WithdrawalError::InvalidTransition`] unless the request awaits approval.
    pub fn approve(self) -> Result<Self, WithdrawalError> {
        self.step("approve", &[Self::AwaitingApproval], Self::Approved)
    }

    /// # Errors
    ///
    /// Returns [`WithdrawalError::InvalidTransition`] once processing has started.
    pub fn reject(self) -> Result<Self, WithdrawalError> {
        self.step(
            "reject",
            &[Self::Created, Self::AwaitingApproval, Self::Approved],
            Self::Rejected,
        )
    }

    /// # Errors
    ///
    /// Returns [`WithdrawalError::InvalidTransition`] unless the request is approved.
    pub fn claim(self) -> Result<Self, WithdrawalError> {
        self.step("process", &[Self::Approved], Self::Processing)
    }

    /// # Errors
    ///
    /// Returns [`WithdrawalError::InvalidTransition`] unless the request is processing.
    pub fn complete(self) -> Result<Self, WithdrawalError> {
        self.step("complete", &[Self::Processing], Self::Completed)
    }
}

impl fmt::Display for WithdrawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for WithdrawStatus {
    type Err = WithdrawalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "awaiting_approval" => Ok(Self::AwaitingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            other => Err(WithdrawalError::UnknownStatus(other.to_string())),
        }
    }
}

/// How the money leaves the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    BankTransfer,
    MobileWallet,
}

impl TransferType {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::MobileWallet => "mobile_wallet",
        }
    }
}

impl FromStr for TransferType {
    type Err = WithdrawalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(Self::BankTransfer),
            "mobile_wallet" => Ok(Self::MobileWallet),
            other => Err(WithdrawalError::UnknownTransferType(other.to_string())),
        }
    }
}

/// Validate a withdrawal request against the current balance and pick its first status.
///
/// # Errors
///
/// - [`WithdrawalError::InvalidAmount`]: the amount is zero.
/// - [`WithdrawalError::InsufficientBalance`]: the balance does not cover the amount.
pub fn open_request(
    balance: SignedAmount,
    amount: Amount,
    review_threshold: Amount,
) -> Result<WithdrawStatus, WithdrawalError> {
    if amount == 0 {
        return Err(WithdrawalError::InvalidAmount);
    }

    ensure_covers(balance, amount)?;

    WithdrawStatus::Created.assess(amount, review_threshold)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn small_requests_are_approved_immediately() -> TestResult {
        assert_eq!(open_request(10_000, 5_000, 5_000)?, WithdrawStatus::Approved);

        Ok(())
    }

    #[test]
    fn large_requests_wait_for_review() -> TestResult {
        assert_eq!(
            open_request(100_000, 50_001, 50_000)?,
            WithdrawStatus::AwaitingApproval
        );

        Ok(())
    }

    #[test]
    fn request_above_balance_is_rejected() {
        assert_eq!(
            open_request(1_000, 1_001, 50_000),
            Err(WithdrawalError::InsufficientBalance(
                LedgerError::InsufficientBalance {
                    balance: 1_000,
                    required: 1_001
                }
            ))
        );
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert_eq!(
            open_request(1_000, 0, 50_000),
            Err(WithdrawalError::InvalidAmount)
        );
    }

    #[test]
    fn reviewed_request_runs_to_completion() -> TestResult {
        let status = WithdrawStatus::AwaitingApproval
            .approve()?
            .claim()?
            .complete()?;

        assert_eq!(status, WithdrawStatus::Completed);

        Ok(())
    }

    #[test]
    fn processing_request_cannot_be_rejected() {
        assert_eq!(
            WithdrawStatus::Processing.reject(),
            Err(WithdrawalError::InvalidTransition {
                step: "reject",
                status: WithdrawStatus::Processing,
            })
        );
    }

    #[test]
    fn only_approved_requests_can_be_claimed() {
        assert!(
            WithdrawStatus::AwaitingApproval.claim().is_err(),
            "unreviewed requests must not be processed"
        );
    }
}
