//! Withdrawals Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use souq::withdrawals::WithdrawStatus;

use crate::{
    database::{db_amount, try_get_amount, try_get_parsed, try_get_timestamp},
    domain::{
        users::records::UserUuid,
        withdrawals::{
            data::NewWithdrawal,
            records::{WithdrawalRecord, WithdrawalUuid},
        },
    },
};

const CREATE_WITHDRAWAL_SQL: &str = include_str!("sql/create_withdrawal.sql");
const GET_WITHDRAWAL_SQL: &str = include_str!("sql/get_withdrawal.sql");
const LOCK_WITHDRAWAL_SQL: &str = include_str!("sql/lock_withdrawal.sql");
const LIST_WITHDRAWALS_SQL: &str = include_str!("sql/list_withdrawals.sql");
const SET_WITHDRAWAL_STATUS_SQL: &str = include_str!("sql/set_withdrawal_status.sql");
const CLAIM_WITHDRAWAL_SQL: &str = include_str!("sql/claim_withdrawal.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgWithdrawalsRepository;

impl PgWithdrawalsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_withdrawal(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        withdrawal: &NewWithdrawal,
    ) -> Result<WithdrawalRecord, sqlx::Error> {
        query_as::<Postgres, WithdrawalRecord>(CREATE_WITHDRAWAL_SQL)
            .bind(withdrawal.uuid.into_uuid())
            .bind(withdrawal.user_uuid.into_uuid())
            .bind(db_amount(withdrawal.amount, "amount")?)
            .bind(withdrawal.transfer_type.to_str())
            .bind(&withdrawal.destination)
            .bind(withdrawal.status.to_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_withdrawal(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, sqlx::Error> {
        query_as::<Postgres, WithdrawalRecord>(GET_WITHDRAWAL_SQL)
            .bind(withdrawal.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_withdrawal(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        withdrawal: WithdrawalUuid,
    ) -> Result<WithdrawalRecord, sqlx::Error> {
        query_as::<Postgres, WithdrawalRecord>(LOCK_WITHDRAWAL_SQL)
            .bind(withdrawal.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Newest first, optionally narrowed to one user and one status.
    pub(crate) async fn list_withdrawals(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: Option<UserUuid>,
        status: Option<WithdrawStatus>,
        limit: u32,
    ) -> Result<Vec<WithdrawalRecord>, sqlx::Error> {
        query_as::<Postgres, WithdrawalRecord>(LIST_WITHDRAWALS_SQL)
            .bind(user.map(UserUuid::into_uuid))
            .bind(status.map(WithdrawStatus::to_str))
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        withdrawal: WithdrawalUuid,
        status: WithdrawStatus,
    ) -> Result<(), sqlx::Error> {
        query(SET_WITHDRAWAL_STATUS_SQL)
            .bind(withdrawal.into_uuid())
            .bind(status.to_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Move an approved withdrawal to `processing`. Returns `false` when someone else got there
    /// first or it was never approved.
    pub(crate) async fn claim(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        withdrawal: WithdrawalUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(CLAIM_WITHDRAWAL_SQL)
            .bind(withdrawal.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }
}

impl<'r> FromRow<'r, PgRow> for WithdrawalRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: WithdrawalUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            amount: try_get_amount(row, "amount")?,
            transfer_type: try_get_parsed(row, "transfer_type")?,
            destination: row.try_get("destination")?,
            status: try_get_parsed(row, "status")?,
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}
