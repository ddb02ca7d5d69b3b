//! Return Requests Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use souq::{
    returns::{ReturnStatus, ReturnableLine},
    shipments::ConfirmationCode,
};

use crate::{
    database::{
        db_amount, db_count, try_get_amount, try_get_count, try_get_parsed, try_get_timestamp,
    },
    domain::{
        orders::records::{OrderItemUuid, OrderUuid},
        products::records::ProductUuid,
        returns::{
            data::NewReturnRequest,
            records::{ReturnRequestRecord, ReturnRequestUuid},
        },
        users::records::UserUuid,
    },
};

const CREATE_RETURN_REQUEST_SQL: &str = include_str!("sql/create_return_request.sql");
const GET_RETURN_REQUEST_SQL: &str = include_str!("sql/get_return_request.sql");
const LOCK_RETURN_REQUEST_SQL: &str = include_str!("sql/lock_return_request.sql");
const LIST_USER_RETURNS_SQL: &str = include_str!("sql/list_user_returns.sql");
const SET_RETURN_STATUS_SQL: &str = include_str!("sql/set_return_status.sql");
const LOCK_RETURNABLE_LINE_SQL: &str = include_str!("sql/lock_returnable_line.sql");
const SUM_HELD_QUANTITY_SQL: &str = include_str!("sql/sum_held_quantity.sql");

/// An order line locked for a new return, with the supplier who sold it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LockedLine {
    pub supplier_uuid: UserUuid,
    pub line: ReturnableLine,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgReturnsRepository;

impl PgReturnsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Lock an order line and count what earlier, still-open returns already hold.
    pub(crate) async fn lock_returnable_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: OrderItemUuid,
    ) -> Result<LockedLine, sqlx::Error> {
        let row = query(LOCK_RETURNABLE_LINE_SQL)
            .bind(item.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        let held: i64 = query(SUM_HELD_QUANTITY_SQL)
            .bind(item.into_uuid())
            .fetch_one(&mut **tx)
            .await?
            .try_get("held")?;

        let already_returned = u32::try_from(held).map_err(|e| sqlx::Error::ColumnDecode {
            index: "held".to_string(),
            source: Box::new(e),
        })?;

        Ok(LockedLine {
            supplier_uuid: UserUuid::from_uuid(row.try_get("supplier_uuid")?),
            line: ReturnableLine {
                buyer: row.try_get("buyer_uuid")?,
                order_status: try_get_parsed(&row, "order_status")?,
                unit_price: try_get_amount(&row, "unit_price")?,
                purchased: try_get_count(&row, "quantity")?,
                discount: try_get_amount(&row, "discount")?,
                already_returned,
            },
        })
    }

    pub(crate) async fn create_return_request(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: &NewReturnRequest,
    ) -> Result<ReturnRequestRecord, sqlx::Error> {
        query_as::<Postgres, ReturnRequestRecord>(CREATE_RETURN_REQUEST_SQL)
            .bind(request.uuid.into_uuid())
            .bind(request.order_item_uuid.into_uuid())
            .bind(request.customer_uuid.into_uuid())
            .bind(request.supplier_uuid.into_uuid())
            .bind(db_count(request.quantity, "quantity")?)
            .bind(db_amount(request.amount, "amount")?)
            .bind(&request.reason)
            .bind(request.confirmation_code.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_return_request(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: ReturnRequestUuid,
    ) -> Result<ReturnRequestRecord, sqlx::Error> {
        query_as::<Postgres, ReturnRequestRecord>(GET_RETURN_REQUEST_SQL)
            .bind(request.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_return_request(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: ReturnRequestUuid,
    ) -> Result<ReturnRequestRecord, sqlx::Error> {
        query_as::<Postgres, ReturnRequestRecord>(LOCK_RETURN_REQUEST_SQL)
            .bind(request.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Returns the user opened as a customer or received as a supplier, newest first.
    pub(crate) async fn list_user_returns(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<ReturnRequestRecord>, sqlx::Error> {
        query_as::<Postgres, ReturnRequestRecord>(LIST_USER_RETURNS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: ReturnRequestUuid,
        status: ReturnStatus,
    ) -> Result<(), sqlx::Error> {
        query(SET_RETURN_STATUS_SQL)
            .bind(request.into_uuid())
            .bind(status.to_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for ReturnRequestRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ReturnRequestUuid::from_uuid(row.try_get("uuid")?),
            order_item_uuid: OrderItemUuid::from_uuid(row.try_get("order_item_uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            customer_uuid: UserUuid::from_uuid(row.try_get("customer_uuid")?),
            supplier_uuid: UserUuid::from_uuid(row.try_get("supplier_uuid")?),
            quantity: try_get_count(row, "quantity")?,
            amount: try_get_amount(row, "amount")?,
            reason: row.try_get("reason")?,
            status: try_get_parsed(row, "status")?,
            confirmation_code: ConfirmationCode::from(
                row.try_get::<String, _>("confirmation_code")?,
            ),
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}
