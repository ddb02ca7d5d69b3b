//! Carts Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::{
    database::try_get_timestamp,
    domain::{
        carts::records::{CartRecord, CartUuid},
        users::records::UserUuid,
    },
};

const ENSURE_CART_SQL: &str = include_str!("../sql/ensure_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Fetch the user's cart, opening one on first use.
    pub(crate) async fn ensure_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(ENSURE_CART_SQL)
            .bind(CartUuid::new().into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CartRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            items: Vec::new(),
            created_at: try_get_timestamp(row, "created_at")?,
        })
    }
}
