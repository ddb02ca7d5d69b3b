//! Ledger service.

use async_trait::async_trait;
use mockall::automock;

use souq::actors::Actor;

use crate::{
    database::Db,
    domain::{
        ledger::{
            errors::LedgerServiceError,
            records::{Balance, TransactionRecord},
            repository::PgLedgerRepository,
        },
        users::records::UserUuid,
    },
};

/// Upper bound on history page size.
pub const MAX_HISTORY: u32 = 200;

#[derive(Debug, Clone)]
pub struct PgLedgerService {
    db: Db,
    repository: PgLedgerRepository,
}

impl PgLedgerService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgLedgerRepository::new(),
        }
    }
}

fn ensure_reads(actor: &Actor, user: UserUuid) -> Result<(), LedgerServiceError> {
    if actor.is_or_admin(user.into_uuid()) {
        Ok(())
    } else {
        Err(LedgerServiceError::Forbidden)
    }
}

#[async_trait]
impl LedgerService for PgLedgerService {
    async fn balance(&self, actor: &Actor, user: UserUuid) -> Result<Balance, LedgerServiceError> {
        ensure_reads(actor, user)?;

        let mut tx = self.db.begin().await?;

        let balance = self.repository.get_balance(&mut tx, user).await?;

        tx.commit().await?;

        Ok(Balance {
            user: user.into_uuid(),
            balance,
        })
    }

    async fn history(
        &self,
        actor: &Actor,
        user: UserUuid,
        limit: u32,
    ) -> Result<Vec<TransactionRecord>, LedgerServiceError> {
        ensure_reads(actor, user)?;

        let mut tx = self.db.begin().await?;

        let transactions = self
            .repository
            .list_transactions(&mut tx, user, limit.clamp(1, MAX_HISTORY))
            .await?;

        tx.commit().await?;

        Ok(transactions)
    }
}

#[automock]
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Current cached balance of a user.
    async fn balance(&self, actor: &Actor, user: UserUuid) -> Result<Balance, LedgerServiceError>;

    /// Most recent transactions of a user, newest first.
    async fn history(
        &self,
        actor: &Actor,
        user: UserUuid,
        limit: u32,
    ) -> Result<Vec<TransactionRecord>, LedgerServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use uuid::Uuid;

    use souq::{
        actors::Role,
        ledger::{Posting, RelatedObject, TransactionType},
    };

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn replayed_posting_is_applied_once() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = ctx.customer().await?;
        let repository = PgLedgerRepository::new();
        let posting = Posting {
            user: customer.into_uuid(),
            kind: TransactionType::Cashback,
            amount: 650,
            related: RelatedObject::Order(Uuid::now_v7()),
        };

        let mut tx = ctx.db().begin().await?;
        let first = repository.post(&mut tx, &posting).await?;
        let second = repository.post(&mut tx, &posting).await?;
        tx.commit().await?;

        assert!(first, "first posting should apply");
        assert!(!second, "replayed posting should be skipped");

        let actor = ctx.actor(customer, Role::Customer);
        let balance = ctx.ledger.balance(&actor, customer).await?;
        let history = ctx.ledger.history(&actor, customer, 10).await?;

        assert_eq!(balance.balance, 650);
        assert_eq!(history.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn other_users_cannot_read_a_ledger() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.customer().await?;
        let snoop = ctx.customer().await?;

        let result = ctx
            .ledger
            .balance(&ctx.actor(snoop, Role::Customer), owner)
            .await;

        assert!(
            matches!(result, Err(LedgerServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn admin_reads_any_ledger() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.customer().await?;

        let balance = ctx
            .ledger
            .balance(&ctx.actor(ctx.house_account, Role::Admin), owner)
            .await?;

        assert_eq!(balance.balance, 0);

        Ok(())
    }
}
