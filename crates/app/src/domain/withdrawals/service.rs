//! Withdrawals service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use souq::{
    actors::Actor,
    ledger::{RelatedObject, SettlementPolicy},
    money::{Amount, display_amount, signed},
    withdrawals::{WithdrawStatus, WithdrawalError, open_request},
};

use crate::{
    database::Db,
    domain::{
        ledger::repository::PgLedgerRepository,
        users::{records::UserUuid, repository::PgUsersRepository},
        withdrawals::{
            data::{NewWithdrawal, WithdrawalRequest},
            errors::WithdrawalsServiceError,
            records::{WithdrawalRecord, WithdrawalUuid},
            repository::PgWithdrawalsRepository,
        },
    },
    notifications::{Notification, NotificationQueue},
    settings::SettlementSettings,
};

/// Upper bound on listed withdrawals.
pub const MAX_LISTED: u32 = 200;

#[derive(Debug, Clone)]
pub struct PgWithdrawalsService {
    db: Db,
    withdrawals: PgWithdrawalsRepository,
    users: PgUsersRepository,
    ledger: PgLedgerRepository,
    policy: SettlementPolicy,
    review_threshold: Amount,
    currency: String,
    notifications: NotificationQueue,
}

impl PgWithdrawalsService {
    #[must_use]
    pub fn new(db: Db, settlement: &SettlementSettings, notifications: NotificationQueue) -> Self {
        Self {
            db,
            withdrawals: PgWithdrawalsRepository::new(),
            users: PgUsersRepository::new(),
            ledger: PgLedgerRepository::new(),
            policy: settlement.policy(),
            review_threshold: settlement.withdrawal_review_threshold,
            currency: settlement.currency.clone(),
            notifications,
        }
    }

    fn notify(&self, withdrawal: &WithdrawalRecord, text: &str) {
        let amount = signed(withdrawal.amount)
            .map(|amount| display_amount(amount, &self.currency))
            .unwrap_or_else(|_| withdrawal.amount.to_string());

        self.notifications.enqueue(
            Notification::new(
                withdrawal.user_uuid.into_uuid(),
                format!("Your withdrawal of {amount} {text}"),
            )
            .about(RelatedObject::Withdrawal(withdrawal.uuid.into_uuid())),
        );
    }

    /// Lock a withdrawal, apply `step` to its status and store the result.
    async fn transition(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
        step: fn(WithdrawStatus) -> Result<WithdrawStatus, WithdrawalError>,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError> {
        ensure_admin(actor)?;

        let mut tx = self.db.begin().await?;

        let locked = self.withdrawals.lock_withdrawal(&mut tx, withdrawal).await?;
        let status = step(locked.status)?;

        self.withdrawals
            .set_status(&mut tx, withdrawal, status)
            .await?;

        if status == WithdrawStatus::Rejected {
            let refund = self.policy.withdrawal_cancelled(
                locked.user_uuid.into_uuid(),
                withdrawal.into_uuid(),
                locked.amount,
            )?;

            self.ledger.post(&mut tx, &refund).await?;
        }

        let updated = self.withdrawals.get_withdrawal(&mut tx, withdrawal).await?;

        tx.commit().await?;

        Span::current().record("status", status.to_str());

        info!(
            withdrawal_uuid = %withdrawal,
            from = %locked.status,
            to = %status,
            "withdrawal transitioned"
        );

        Ok(updated)
    }
}

fn ensure_admin(actor: &Actor) -> Result<(), WithdrawalsServiceError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(WithdrawalsServiceError::Forbidden)
    }
}

#[async_trait]
impl WithdrawalsService for PgWithdrawalsService {
    #[tracing::instrument(
        name = "withdrawals.service.request_withdrawal",
        skip(self, actor, request),
        fields(user_uuid = %actor.user, amount = request.amount, status),
        err
    )]
    async fn request_withdrawal(
        &self,
        actor: &Actor,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError> {
        if request.destination.trim().is_empty() {
            return Err(WithdrawalsServiceError::MissingDestination);
        }

        let mut tx = self.db.begin().await?;

        let user = self.users.lock_user(&mut tx, actor.user.into()).await?;
        let status = open_request(user.balance, request.amount, self.review_threshold)?;

        let withdrawal = self
            .withdrawals
            .create_withdrawal(
                &mut tx,
                &NewWithdrawal {
                    uuid: WithdrawalUuid::new(),
                    user_uuid: user.uuid,
                    amount: request.amount,
                    transfer_type: request.transfer_type,
                    destination: request.destination,
                    status,
                },
            )
            .await?;

        let hold = self.policy.withdrawal_request(
            user.uuid.into_uuid(),
            withdrawal.uuid.into_uuid(),
            withdrawal.amount,
        )?;

        self.ledger.post(&mut tx, &hold).await?;

        tx.commit().await?;

        Span::current().record("status", status.to_str());

        info!(
            withdrawal_uuid = %withdrawal.uuid,
            status = %status,
            "requested withdrawal"
        );

        if status == WithdrawStatus::AwaitingApproval {
            self.notify(&withdrawal, "is waiting for review");
        }

        Ok(withdrawal)
    }

    async fn get_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError> {
        let mut tx = self.db.begin().await?;

        let withdrawal = self.withdrawals.get_withdrawal(&mut tx, withdrawal).await?;

        tx.commit().await?;

        if !actor.is_or_admin(withdrawal.user_uuid.into_uuid()) {
            return Err(WithdrawalsServiceError::Forbidden);
        }

        Ok(withdrawal)
    }

    async fn list_withdrawals(
        &self,
        actor: &Actor,
        status: Option<WithdrawStatus>,
    ) -> Result<Vec<WithdrawalRecord>, WithdrawalsServiceError> {
        let owner = (!actor.is_admin()).then(|| UserUuid::from(actor.user));
        let mut tx = self.db.begin().await?;

        let withdrawals = self
            .withdrawals
            .list_withdrawals(&mut tx, owner, status, MAX_LISTED)
            .await?;

        tx.commit().await?;

        Ok(withdrawals)
    }

    #[tracing::instrument(
        name = "withdrawals.service.approve_withdrawal",
        skip(self, actor),
        fields(withdrawal_uuid = %withdrawal, status),
        err
    )]
    async fn approve_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError> {
        let approved = self
            .transition(actor, withdrawal, WithdrawStatus::approve)
            .await?;

        self.notify(&approved, "was approved");

        Ok(approved)
    }

    #[tracing::instrument(
        name = "withdrawals.service.reject_withdrawal",
        skip(self, actor),
        fields(withdrawal_uuid = %withdrawal, status),
        err
    )]
    async fn reject_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError> {
        let rejected = self
            .transition(actor, withdrawal, WithdrawStatus::reject)
            .await?;

        self.notify(&rejected, "was rejected and returned to your balance");

        Ok(rejected)
    }

    #[tracing::instrument(
        name = "withdrawals.service.process_withdrawal",
        skip(self, actor),
        fields(withdrawal_uuid = %withdrawal),
        err
    )]
    async fn process_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError> {
        ensure_admin(actor)?;

        let mut tx = self.db.begin().await?;

        let current = self.withdrawals.get_withdrawal(&mut tx, withdrawal).await?;

        current.status.claim()?;

        if !self.withdrawals.claim(&mut tx, withdrawal).await? {
            let raced = self.withdrawals.get_withdrawal(&mut tx, withdrawal).await?;

            return Err(WithdrawalError::InvalidTransition {
                step: "process",
                status: raced.status,
            }
            .into());
        }

        let claimed = self.withdrawals.get_withdrawal(&mut tx, withdrawal).await?;

        tx.commit().await?;

        info!(withdrawal_uuid = %withdrawal, "claimed withdrawal for processing");

        Ok(claimed)
    }

    #[tracing::instrument(
        name = "withdrawals.service.complete_withdrawal",
        skip(self, actor),
        fields(withdrawal_uuid = %withdrawal, status),
        err
    )]
    async fn complete_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError> {
        let completed = self
            .transition(actor, withdrawal, WithdrawStatus::complete)
            .await?;

        self.notify(&completed, "has been sent");

        Ok(completed)
    }
}

#[automock]
#[async_trait]
pub trait WithdrawalsService: Send + Sync {
    /// Hold part of the caller's balance for a payout.
    ///
    /// Requests above the review threshold wait for an admin, smaller ones are approved at once.
    async fn request_withdrawal(
        &self,
        actor: &Actor,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError>;

    async fn get_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError>;

    /// Admins see every withdrawal, everyone else their own.
    async fn list_withdrawals(
        &self,
        actor: &Actor,
        status: Option<WithdrawStatus>,
    ) -> Result<Vec<WithdrawalRecord>, WithdrawalsServiceError>;

    async fn approve_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError>;

    /// Reject a request and give the held amount back.
    async fn reject_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError>;

    /// Claim an approved request. Only one concurrent caller succeeds.
    async fn process_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError>;

    async fn complete_withdrawal(
        &self,
        actor: &Actor,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, WithdrawalsServiceError>;
}
