//! Products Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::{db_amount, try_get_amount, try_get_timestamp},
    domain::{
        products::{
            data::{NewProduct, ProductUpdate},
            records::{ProductRecord, ProductUuid},
        },
        users::records::UserUuid,
    },
};

const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const LIST_SUPPLIER_PRODUCTS_SQL: &str = include_str!("sql/list_supplier_products.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const TAKE_STOCK_SQL: &str = include_str!("sql/take_stock.sql");
const RESTOCK_SQL: &str = include_str!("sql/restock.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &NewProduct,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(product.supplier_uuid.into_uuid())
            .bind(&product.name)
            .bind(db_amount(product.price, "price")?)
            .bind(db_amount(product.stock, "stock")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_supplier_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        supplier: UserUuid,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LIST_SUPPLIER_PRODUCTS_SQL)
            .bind(supplier.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        update: &ProductUpdate,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(UPDATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(db_amount(update.price, "price")?)
            .bind(db_amount(update.stock, "stock")?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Decrement stock only when enough is left; returns whether the decrement happened.
    pub(crate) async fn take_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(TAKE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(quantity))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    pub(crate) async fn restock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), sqlx::Error> {
        query(RESTOCK_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(quantity))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            supplier_uuid: UserUuid::from_uuid(row.try_get("supplier_uuid")?),
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
            stock: try_get_amount(row, "stock")?,
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}
