//! Database connection management

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use thiserror::Error;

use souq::money::{Amount, SignedAmount};

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction fails.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Apply the bundled schema migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Read a non-negative `BIGINT` amount column.
pub(crate) fn try_get_amount(row: &PgRow, col: &str) -> Result<Amount, sqlx::Error> {
    let amount: i64 = row.try_get(col)?;

    Amount::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Read a non-negative `INTEGER` count column.
pub(crate) fn try_get_count(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let count: i32 = row.try_get(col)?;

    u32::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Read a `TIMESTAMPTZ` column.
pub(crate) fn try_get_timestamp(row: &PgRow, col: &str) -> Result<jiff::Timestamp, sqlx::Error> {
    Ok(row.try_get::<SqlxTimestamp, _>(col)?.to_jiff())
}

/// Read a parsed text column.
pub(crate) fn try_get_parsed<T>(row: &PgRow, col: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(col)?;

    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Convert an amount for binding to a `BIGINT` column.
pub(crate) fn db_amount(amount: Amount, col: &str) -> Result<SignedAmount, sqlx::Error> {
    SignedAmount::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Convert a count for binding to an `INTEGER` column.
pub(crate) fn db_count(count: u32, col: &str) -> Result<i32, sqlx::Error> {
    i32::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Stored value outside the set the domain understands.
#[derive(Debug, Error)]
#[error("unknown value {0:?}")]
pub(crate) struct UnknownValue(String);

/// Decode error for a column holding an unrecognised value.
pub(crate) fn unknown_value(col: &str, value: impl Into<String>) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(UnknownValue(value.into())),
    }
}
