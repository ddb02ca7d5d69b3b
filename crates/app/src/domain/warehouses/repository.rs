//! Warehouses Repository

use sqlx::{Postgres, Row, Transaction, postgres::PgRow, query};

use souq::regions::{Region, Warehouse};

use crate::database::{db_amount, try_get_amount};

const UPSERT_WAREHOUSE_SQL: &str = include_str!("sql/upsert_warehouse.sql");
const LIST_WAREHOUSES_SQL: &str = include_str!("sql/list_warehouses.sql");
const GET_WAREHOUSE_SQL: &str = include_str!("sql/get_warehouse.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgWarehousesRepository;

impl PgWarehousesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn upsert_warehouse(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        warehouse: &Warehouse,
    ) -> Result<Warehouse, sqlx::Error> {
        let row = query(UPSERT_WAREHOUSE_SQL)
            .bind(warehouse.region.as_str())
            .bind(&warehouse.address)
            .bind(db_amount(warehouse.flat_fee, "flat_fee")?)
            .fetch_one(&mut **tx)
            .await?;

        warehouse_from_row(&row)
    }

    pub(crate) async fn list_warehouses(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Warehouse>, sqlx::Error> {
        query(LIST_WAREHOUSES_SQL)
            .fetch_all(&mut **tx)
            .await?
            .iter()
            .map(warehouse_from_row)
            .collect()
    }

    pub(crate) async fn get_warehouse(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        region: &Region,
    ) -> Result<Warehouse, sqlx::Error> {
        let row = query(GET_WAREHOUSE_SQL)
            .bind(region.as_str())
            .fetch_one(&mut **tx)
            .await?;

        warehouse_from_row(&row)
    }
}

fn warehouse_from_row(row: &PgRow) -> Result<Warehouse, sqlx::Error> {
    Ok(Warehouse {
        region: Region::from(row.try_get::<String, _>("region")?),
        address: row.try_get("address")?,
        flat_fee: try_get_amount(row, "flat_fee")?,
    })
}
