//! Coupons Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{Postgres, Row, Transaction, postgres::PgRow, query};
use thiserror::Error;
use uuid::Uuid;

use souq::coupons::{Coupon, CouponDiscount};

use crate::{
    database::{db_amount, db_count, try_get_amount, try_get_count, try_get_timestamp},
    domain::{coupons::data::NewCoupon, users::records::UserUuid},
};

const CREATE_COUPON_SQL: &str = include_str!("sql/create_coupon.sql");
const GET_COUPON_SQL: &str = include_str!("sql/get_coupon.sql");
const LOCK_COUPON_SQL: &str = include_str!("sql/lock_coupon.sql");
const COUNT_USER_USAGES_SQL: &str = include_str!("sql/count_user_usages.sql");
const RECORD_USAGE_SQL: &str = include_str!("sql/record_usage.sql");
const INCREMENT_USES_SQL: &str = include_str!("sql/increment_uses.sql");
const SET_ACTIVE_SQL: &str = include_str!("sql/set_active.sql");

#[derive(Debug, Error)]
#[error("unknown discount type: {0}")]
struct UnknownDiscountType(String);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: &NewCoupon,
    ) -> Result<Coupon, sqlx::Error> {
        let discount_value = match coupon.discount {
            CouponDiscount::PercentageOff { percentage } => i64::from(percentage),
            CouponDiscount::FixedAmountOff { amount } => db_amount(amount, "discount_value")?,
        };

        let row = query(CREATE_COUPON_SQL)
            .bind(coupon.uuid)
            .bind(&coupon.code)
            .bind(coupon.supplier_uuid.into_uuid())
            .bind(coupon.discount.to_str())
            .bind(discount_value)
            .bind(db_amount(coupon.min_purchase_amount, "min_purchase_amount")?)
            .bind(SqlxTimestamp::from(coupon.valid_from))
            .bind(coupon.valid_until.map(SqlxTimestamp::from))
            .bind(db_count(coupon.max_uses, "max_uses")?)
            .bind(db_count(coupon.max_uses_per_user, "max_uses_per_user")?)
            .fetch_one(&mut **tx)
            .await?;

        coupon_from_row(&row)
    }

    pub(crate) async fn get_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Coupon, sqlx::Error> {
        let row = query(GET_COUPON_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await?;

        coupon_from_row(&row)
    }

    /// Lock the coupon so concurrent checkouts observe each other's usage counts.
    pub(crate) async fn lock_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Coupon, sqlx::Error> {
        let row = query(LOCK_COUPON_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await?;

        coupon_from_row(&row)
    }

    pub(crate) async fn count_user_usages(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: Uuid,
        user: UserUuid,
    ) -> Result<u32, sqlx::Error> {
        let row = query(COUNT_USER_USAGES_SQL)
            .bind(coupon)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        try_get_count(&row, "usages")
    }

    /// Count one redemption; returns `false` when the usage cap is already reached.
    pub(crate) async fn redeem(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: Uuid,
        user: UserUuid,
        order: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let incremented = query(INCREMENT_USES_SQL)
            .bind(coupon)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if incremented == 0 {
            return Ok(false);
        }

        query(RECORD_USAGE_SQL)
            .bind(Uuid::now_v7())
            .bind(coupon)
            .bind(user.into_uuid())
            .bind(order)
            .execute(&mut **tx)
            .await?;

        Ok(true)
    }

    pub(crate) async fn set_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        active: bool,
    ) -> Result<Coupon, sqlx::Error> {
        let row = query(SET_ACTIVE_SQL)
            .bind(code)
            .bind(active)
            .fetch_one(&mut **tx)
            .await?;

        coupon_from_row(&row)
    }
}

fn coupon_from_row(row: &PgRow) -> Result<Coupon, sqlx::Error> {
    let discount_type: String = row.try_get("discount_type")?;
    let discount_value = try_get_amount(row, "discount_value")?;

    let discount = match discount_type.as_str() {
        "percentage" => CouponDiscount::PercentageOff {
            percentage: u16::try_from(discount_value).map_err(|e| sqlx::Error::ColumnDecode {
                index: "discount_value".to_string(),
                source: Box::new(e),
            })?,
        },
        "fixed" => CouponDiscount::FixedAmountOff {
            amount: discount_value,
        },
        other => {
            return Err(sqlx::Error::ColumnDecode {
                index: "discount_type".to_string(),
                source: Box::new(UnknownDiscountType(other.to_string())),
            });
        }
    };

    Ok(Coupon {
        uuid: row.try_get("uuid")?,
        code: row.try_get("code")?,
        supplier: row.try_get("supplier_uuid")?,
        discount,
        min_purchase_amount: try_get_amount(row, "min_purchase_amount")?,
        valid_from: try_get_timestamp(row, "valid_from")?,
        valid_until: row
            .try_get::<Option<SqlxTimestamp>, _>("valid_until")?
            .map(SqlxTimestamp::to_jiff),
        active: row.try_get("active")?,
        max_uses: try_get_count(row, "max_uses")?,
        max_uses_per_user: try_get_count(row, "max_uses_per_user")?,
        uses_count: try_get_count(row, "uses_count")?,
    })
}
