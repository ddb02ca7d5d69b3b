//! Ledger Repository
//!
//! Every balance change goes through [`PgLedgerRepository::post`], which writes the transaction row
//! and adjusts the cached balance together.

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use souq::{
    ledger::{Posting, RelatedObject, TransactionType},
    money::SignedAmount,
};

use crate::{
    database::{try_get_parsed, try_get_timestamp},
    domain::{
        ledger::records::{TransactionRecord, TransactionUuid},
        users::records::UserUuid,
    },
};

const INSERT_TRANSACTION_SQL: &str = include_str!("sql/insert_transaction.sql");
const ADJUST_BALANCE_SQL: &str = include_str!("sql/adjust_balance.sql");
const GET_BALANCE_SQL: &str = include_str!("sql/get_balance.sql");
const LIST_TRANSACTIONS_SQL: &str = include_str!("sql/list_transactions.sql");
const SUM_POSTED_SQL: &str = include_str!("sql/sum_posted.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgLedgerRepository;

impl PgLedgerRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Record a posting and apply it to the user's balance.
    ///
    /// A posting already recorded for the same user, type and related object is skipped, so
    /// replayed settlement steps never move money twice. Returns whether the posting was applied.
    pub(crate) async fn post(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        posting: &Posting,
    ) -> Result<bool, sqlx::Error> {
        let inserted = query(INSERT_TRANSACTION_SQL)
            .bind(Uuid::now_v7())
            .bind(posting.user)
            .bind(posting.kind.to_str())
            .bind(posting.amount)
            .bind(posting.related.kind())
            .bind(posting.related.uuid())
            .fetch_optional(&mut **tx)
            .await?;

        if inserted.is_none() {
            return Ok(false);
        }

        let rows_affected = query(ADJUST_BALANCE_SQL)
            .bind(posting.user)
            .bind(posting.amount)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(true)
    }

    pub(crate) async fn post_all<'p>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        postings: impl IntoIterator<Item = &'p Posting>,
    ) -> Result<(), sqlx::Error> {
        for posting in postings {
            self.post(tx, posting).await?;
        }

        Ok(())
    }

    pub(crate) async fn get_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<SignedAmount, sqlx::Error> {
        let row = query(GET_BALANCE_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        row.try_get("balance")
    }

    pub(crate) async fn list_transactions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        limit: u32,
    ) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        query_as::<Postgres, TransactionRecord>(LIST_TRANSACTIONS_SQL)
            .bind(user.into_uuid())
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }

    /// Net amount already posted to a user for one settlement type and object.
    pub(crate) async fn sum_posted(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: Uuid,
        kind: TransactionType,
        related: RelatedObject,
    ) -> Result<SignedAmount, sqlx::Error> {
        let row = query(SUM_POSTED_SQL)
            .bind(user)
            .bind(kind.to_str())
            .bind(related.kind())
            .bind(related.uuid())
            .fetch_one(&mut **tx)
            .await?;

        row.try_get("total")
    }
}

impl<'r> FromRow<'r, PgRow> for TransactionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let related_kind: String = row.try_get("related_kind")?;

        let related = RelatedObject::from_parts(&related_kind, row.try_get("related_uuid")?)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "related_kind".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: TransactionUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            kind: try_get_parsed(row, "type")?,
            amount: row.try_get("amount")?,
            related,
            created_at: try_get_timestamp(row, "created_at")?,
        })
    }
}
