//! Settlement Ledger
//!
//! Postings describe signed balance movements. Each posting becomes exactly one immutable
//! transaction row and one balance adjustment, applied together by the persistence layer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    money::{Amount, MoneyError, SignedAmount, percent_of, signed},
    orders::PaymentMethod,
    pricing::FeeSchedule,
};

/// Errors raised by ledger rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The balance does not cover a debit.
    #[error("insufficient balance: {balance} available, {required} required")]
    InsufficientBalance {
        /// Current balance.
        balance: SignedAmount,
        /// Amount required.
        required: Amount,
    },

    /// Stored transaction type is not recognised.
    #[error("unknown transaction type: {0}")]
    UnknownType(String),

    /// Stored related object kind is not recognised.
    #[error("unknown related object kind: {0}")]
    UnknownRelatedKind(String),

    /// Amount arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Kind of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Cashback,
    CashbackReversal,
    Refund,
    Sale,
    ReturnCredit,
    ReturnDebit,
    DeliveryFee,
    PlatformFee,
    WithdrawalRequest,
    WithdrawalCancelled,
}

impl TransactionType {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Cashback => "cashback",
            Self::CashbackReversal => "cashback_reversal",
            Self::Refund => "refund",
            Self::Sale => "sale",
            Self::ReturnCredit => "return_credit",
            Self::ReturnDebit => "return_debit",
            Self::DeliveryFee => "delivery_fee",
            Self::PlatformFee => "platform_fee",
            Self::WithdrawalRequest => "withdrawal_request",
            Self::WithdrawalCancelled => "withdrawal_cancelled",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "cashback" => Ok(Self::Cashback),
            "cashback_reversal" => Ok(Self::CashbackReversal),
            "refund" => Ok(Self::Refund),
            "sale" => Ok(Self::Sale),
            "return_credit" => Ok(Self::ReturnCredit),
            "return_debit" => Ok(Self::ReturnDebit),
            "delivery_fee" => Ok(Self::DeliveryFee),
            "platform_fee" => Ok(Self::PlatformFee),
            "withdrawal_request" => Ok(Self::WithdrawalRequest),
            "withdrawal_cancelled" => Ok(Self::WithdrawalCancelled),
            other => Err(LedgerError::UnknownType(other.to_string())),
        }
    }
}

/// Entity a transaction documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "uuid", rename_all = "snake_case")]
pub enum RelatedObject {
    Order(Uuid),
    Shipment(Uuid),
    ReturnRequest(Uuid),
    Withdrawal(Uuid),
    Payment(Uuid),
}

impl RelatedObject {
    /// Storage name of the referenced entity kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Order(_) => "order",
            Self::Shipment(_) => "shipment",
            Self::ReturnRequest(_) => "return_request",
            Self::Withdrawal(_) => "withdrawal",
            Self::Payment(_) => "payment",
        }
    }

    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        match self {
            Self::Order(uuid)
            | Self::Shipment(uuid)
            | Self::ReturnRequest(uuid)
            | Self::Withdrawal(uuid)
            | Self::Payment(uuid) => *uuid,
        }
    }

    /// Rebuild a reference from its stored kind and id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownRelatedKind`] for an unrecognised kind.
    pub fn from_parts(kind: &str, uuid: Uuid) -> Result<Self, LedgerError> {
        match kind {
            "order" => Ok(Self::Order(uuid)),
            "shipment" => Ok(Self::Shipment(uuid)),
            "return_request" => Ok(Self::ReturnRequest(uuid)),
            "withdrawal" => Ok(Self::Withdrawal(uuid)),
            "payment" => Ok(Self::Payment(uuid)),
            other => Err(LedgerError::UnknownRelatedKind(other.to_string())),
        }
    }
}

/// A single signed balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub user: Uuid,
    pub kind: TransactionType,
    pub amount: SignedAmount,
    pub related: RelatedObject,
}

impl Posting {
    fn credit(
        user: Uuid,
        kind: TransactionType,
        amount: Amount,
        related: RelatedObject,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            user,
            kind,
            amount: signed(amount)?,
            related,
        })
    }

    fn debit(
        user: Uuid,
        kind: TransactionType,
        amount: Amount,
        related: RelatedObject,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            user,
            kind,
            amount: -signed(amount)?,
            related,
        })
    }

    /// Balance after applying this posting.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the balance overflows.
    pub fn apply(&self, balance: SignedAmount) -> Result<SignedAmount, LedgerError> {
        balance
            .checked_add(self.amount)
            .ok_or(LedgerError::Money(MoneyError::Overflow))
    }
}

/// Postings produced by one settlement step.
pub type Postings = SmallVec<[Posting; 2]>;

/// Check that a balance covers a debit.
///
/// # Errors
///
/// Returns [`LedgerError::InsufficientBalance`] when it does not.
pub fn ensure_covers(balance: SignedAmount, required: Amount) -> Result<(), LedgerError> {
    let covered = i128::from(balance) >= i128::from(required);

    if covered {
        Ok(())
    } else {
        Err(LedgerError::InsufficientBalance { balance, required })
    }
}

/// Builds the postings for each settlement event.
#[derive(Debug, Clone, Copy)]
pub struct SettlementPolicy {
    /// Platform's own ledger account.
    pub house_account: Uuid,
    pub fees: FeeSchedule,
}

impl SettlementPolicy {
    #[must_use]
    pub fn new(house_account: Uuid, fees: FeeSchedule) -> Self {
        Self {
            house_account,
            fees,
        }
    }

    /// Upfront payment for an order. Only balance payments move money at creation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the amount does not fit a ledger amount.
    pub fn purchase(
        &self,
        buyer: Uuid,
        order: Uuid,
        method: PaymentMethod,
        final_amount: Amount,
    ) -> Result<Postings, LedgerError> {
        if method != PaymentMethod::Balance || final_amount == 0 {
            return Ok(Postings::new());
        }

        let related = RelatedObject::Order(order);

        Ok(smallvec![
            Posting::debit(buyer, TransactionType::Purchase, final_amount, related)?,
            Posting::credit(
                self.house_account,
                TransactionType::Purchase,
                final_amount,
                related
            )?,
        ])
    }

    /// Cashback owed to the buyer for an order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the percentage cannot be computed.
    pub fn cashback(
        &self,
        buyer: Uuid,
        order: Uuid,
        final_amount: Amount,
    ) -> Result<Option<Posting>, LedgerError> {
        let amount = percent_of(&self.fees.cashback, final_amount)?;

        if amount == 0 {
            return Ok(None);
        }

        Posting::credit(
            buyer,
            TransactionType::Cashback,
            amount,
            RelatedObject::Order(order),
        )
        .map(Some)
    }

    /// Reverse previously awarded cashback and refund a paid order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when an amount does not fit a ledger amount.
    pub fn cancellation(
        &self,
        buyer: Uuid,
        order: Uuid,
        refund: Option<Amount>,
        cashback_awarded: Amount,
    ) -> Result<SmallVec<[Posting; 3]>, LedgerError> {
        let related = RelatedObject::Order(order);
        let mut postings = SmallVec::new();

        if let Some(amount) = refund.filter(|amount| *amount > 0) {
            postings.push(Posting::credit(
                buyer,
                TransactionType::Refund,
                amount,
                related,
            )?);
            postings.push(Posting::debit(
                self.house_account,
                TransactionType::Refund,
                amount,
                related,
            )?);
        }

        if cashback_awarded > 0 {
            postings.push(Posting::debit(
                buyer,
                TransactionType::CashbackReversal,
                cashback_awarded,
                related,
            )?);
        }

        Ok(postings)
    }

    /// Pay a delivery person for a completed leg, keeping the platform cut.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the cut cannot be computed.
    pub fn delivery_payout(
        &self,
        delivery_person: Uuid,
        shipment: Uuid,
        fee: Amount,
    ) -> Result<Postings, LedgerError> {
        let cut = percent_of(&self.fees.platform_cut, fee)?.min(fee);
        let payout = fee - cut;
        let related = RelatedObject::Shipment(shipment);
        let mut postings = Postings::new();

        if payout > 0 {
            postings.push(Posting::credit(
                delivery_person,
                TransactionType::DeliveryFee,
                payout,
                related,
            )?);
        }

        if cut > 0 {
            postings.push(Posting::credit(
                self.house_account,
                TransactionType::PlatformFee,
                cut,
                related,
            )?);
        }

        Ok(postings)
    }

    /// Credit a supplier with delivered goods value.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the amount does not fit a ledger amount.
    pub fn sale(
        &self,
        supplier: Uuid,
        order: Uuid,
        net_goods_value: Amount,
    ) -> Result<Option<Posting>, LedgerError> {
        if net_goods_value == 0 {
            return Ok(None);
        }

        Posting::credit(
            supplier,
            TransactionType::Sale,
            net_goods_value,
            RelatedObject::Order(order),
        )
        .map(Some)
    }

    /// Move the value of returned goods from the supplier back to the customer.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the amount does not fit a ledger amount.
    pub fn return_settlement(
        &self,
        customer: Uuid,
        supplier: Uuid,
        return_request: Uuid,
        amount: Amount,
    ) -> Result<Postings, LedgerError> {
        if amount == 0 {
            return Ok(Postings::new());
        }

        let related = RelatedObject::ReturnRequest(return_request);

        Ok(smallvec![
            Posting::credit(customer, TransactionType::ReturnCredit, amount, related)?,
            Posting::debit(supplier, TransactionType::ReturnDebit, amount, related)?,
        ])
    }

    /// Return a captured card payment that never became an order to the buyer's balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the amount does not fit a ledger amount.
    pub fn payment_refund(
        &self,
        buyer: Uuid,
        payment: Uuid,
        amount: Amount,
    ) -> Result<Postings, LedgerError> {
        if amount == 0 {
            return Ok(Postings::new());
        }

        let related = RelatedObject::Payment(payment);

        Ok(smallvec![
            Posting::credit(buyer, TransactionType::Refund, amount, related)?,
            Posting::debit(self.house_account, TransactionType::Refund, amount, related)?,
        ])
    }

    /// Hold the requested amount while a withdrawal is pending.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the amount does not fit a ledger amount.
    pub fn withdrawal_request(
        &self,
        user: Uuid,
        withdrawal: Uuid,
        amount: Amount,
    ) -> Result<Posting, LedgerError> {
        Posting::debit(
            user,
            TransactionType::WithdrawalRequest,
            amount,
            RelatedObject::Withdrawal(withdrawal),
        )
    }

    /// Give back the held amount of a rejected withdrawal.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Money`] when the amount does not fit a ledger amount.
    pub fn withdrawal_cancelled(
        &self,
        user: Uuid,
        withdrawal: Uuid,
        amount: Amount,
    ) -> Result<Posting, LedgerError> {
        Posting::credit(
            user,
            TransactionType::WithdrawalCancelled,
            amount,
            RelatedObject::Withdrawal(withdrawal),
        )
    }
}
