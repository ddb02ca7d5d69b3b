//! Payments Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{db_amount, db_count, try_get_amount, try_get_parsed, try_get_timestamp},
    domain::{
        carts::records::CheckoutLineRecord,
        orders::records::OrderUuid,
        payments::{
            data::NewPayment,
            records::{PaymentRecord, PaymentStatus, PaymentUuid},
        },
        users::records::{AddressUuid, UserUuid},
    },
};

const CREATE_PAYMENT_SQL: &str = include_str!("sql/create_payment.sql");
const CREATE_PAYMENT_LINE_SQL: &str = include_str!("sql/create_payment_line.sql");
const GET_PAYMENT_LINES_SQL: &str = include_str!("sql/get_payment_lines.sql");
const GET_PAYMENT_SQL: &str = include_str!("sql/get_payment.sql");
const LOCK_PAYMENT_SQL: &str = include_str!("sql/lock_payment.sql");
const SETTLE_PAYMENT_SQL: &str = include_str!("sql/settle_payment.sql");
const ATTACH_ORDER_SQL: &str = include_str!("sql/attach_order.sql");
const EXPIRE_STALE_SQL: &str = include_str!("sql/expire_stale.sql");
const MARK_REFUNDED_SQL: &str = include_str!("sql/mark_refunded.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPaymentsRepository;

impl PgPaymentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: &NewPayment,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(CREATE_PAYMENT_SQL)
            .bind(payment.uuid.into_uuid())
            .bind(payment.user_uuid.into_uuid())
            .bind(payment.address_uuid.into_uuid())
            .bind(payment.coupon_code.as_deref())
            .bind(db_amount(payment.amount, "amount")?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Freeze the priced lines a card payment is charged for.
    pub(crate) async fn create_payment_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
        lines: &[CheckoutLineRecord],
    ) -> Result<(), sqlx::Error> {
        for (line_number, line) in (0_u32..).zip(lines) {
            query(CREATE_PAYMENT_LINE_SQL)
                .bind(payment.into_uuid())
                .bind(db_count(line_number, "line_number")?)
                .bind(line.item_uuid.into_uuid())
                .bind(line.product_uuid.into_uuid())
                .bind(db_count(line.quantity, "quantity")?)
                .bind(db_amount(line.unit_price, "unit_price")?)
                .bind(line.color.as_deref())
                .bind(line.size.as_deref())
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    /// The frozen lines, at their checkout prices, with each supplier's current pickup address.
    pub(crate) async fn get_payment_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<Vec<CheckoutLineRecord>, sqlx::Error> {
        query_as::<Postgres, CheckoutLineRecord>(GET_PAYMENT_LINES_SQL)
            .bind(payment.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(GET_PAYMENT_SQL)
            .bind(payment.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(LOCK_PAYMENT_SQL)
            .bind(payment.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Move a pending payment to `status`. Returns `false` when it was no longer pending.
    pub(crate) async fn settle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
        status: PaymentStatus,
        provider_reference: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(SETTLE_PAYMENT_SQL)
            .bind(payment.into_uuid())
            .bind(status.to_str())
            .bind(provider_reference)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    pub(crate) async fn attach_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
        order: OrderUuid,
    ) -> Result<(), sqlx::Error> {
        query(ATTACH_ORDER_SQL)
            .bind(payment.into_uuid())
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Stamp a failed or expired payment as refunded. Returns `false` when it already was.
    pub(crate) async fn mark_refunded(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(MARK_REFUNDED_SQL)
            .bind(payment.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    /// Expire pending payments created before `cutoff`.
    pub(crate) async fn expire_stale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cutoff: Timestamp,
    ) -> Result<Vec<PaymentUuid>, sqlx::Error> {
        let rows = query(EXPIRE_STALE_SQL)
            .bind(SqlxTimestamp::from(cutoff))
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| Ok(PaymentUuid::from_uuid(row.try_get("uuid")?)))
            .collect()
    }
}

impl<'r> FromRow<'r, PgRow> for PaymentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PaymentUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            address_uuid: AddressUuid::from_uuid(row.try_get("address_uuid")?),
            coupon_code: row.try_get("coupon_code")?,
            amount: try_get_amount(row, "amount")?,
            status: try_get_parsed(row, "status")?,
            provider_reference: row.try_get("provider_reference")?,
            order_uuid: row
                .try_get::<Option<Uuid>, _>("order_uuid")?
                .map(OrderUuid::from_uuid),
            refunded_at: row
                .try_get::<Option<SqlxTimestamp>, _>("refunded_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}
