//! Cart Items Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use souq::regions::Region;

use crate::{
    database::{db_count, try_get_amount, try_get_count, try_get_timestamp},
    domain::{
        carts::{
            data::NewCartItem,
            records::{CartItemRecord, CartItemUuid, CartUuid, CheckoutLineRecord},
        },
        products::records::ProductUuid,
        users::records::UserUuid,
    },
};

const GET_CART_ITEMS_SQL: &str = include_str!("../sql/get_cart_items.sql");
const CREATE_CART_ITEM_SQL: &str = include_str!("../sql/create_cart_item.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("../sql/delete_cart_item.sql");
const DELETE_CART_ITEMS_SQL: &str = include_str!("../sql/delete_cart_items.sql");
const GET_CHECKOUT_LINES_SQL: &str = include_str!("../sql/get_checkout_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_cart_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<CartItemRecord>, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(GET_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_cart_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        item: &NewCartItem,
    ) -> Result<CartItemRecord, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(CREATE_CART_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(cart.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(db_count(item.quantity, "quantity")?)
            .bind(item.color.as_deref())
            .bind(item.size.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_cart_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        item: CartItemUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Remove the items consumed by an order.
    pub(crate) async fn delete_cart_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[CartItemUuid],
    ) -> Result<u64, sqlx::Error> {
        let uuids: Vec<Uuid> = items.iter().map(|item| item.into_uuid()).collect();

        let rows_affected = query(DELETE_CART_ITEMS_SQL)
            .bind(uuids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn get_checkout_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<CheckoutLineRecord>, sqlx::Error> {
        query_as::<Postgres, CheckoutLineRecord>(GET_CHECKOUT_LINES_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CartItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartItemUuid::from_uuid(row.try_get("uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_count(row, "quantity")?,
            color: row.try_get("color")?,
            size: row.try_get("size")?,
            created_at: try_get_timestamp(row, "created_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CheckoutLineRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            item_uuid: CartItemUuid::from_uuid(row.try_get("item_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            supplier_uuid: UserUuid::from_uuid(row.try_get("supplier_uuid")?),
            unit_price: try_get_amount(row, "unit_price")?,
            quantity: try_get_count(row, "quantity")?,
            color: row.try_get("color")?,
            size: row.try_get("size")?,
            supplier_region: row
                .try_get::<Option<String>, _>("supplier_region")?
                .map(Region::from),
            supplier_address: row.try_get("supplier_address")?,
        })
    }
}
