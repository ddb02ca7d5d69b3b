//! Orders Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use souq::{
    orders::OrderStatus,
    pricing::Totals,
    regions::Region,
    shipments::ConfirmationCode,
};

use crate::{
    database::{
        db_amount, db_count, try_get_amount, try_get_count, try_get_parsed, try_get_timestamp,
    },
    domain::{
        orders::{
            data::{NewOrder, NewOrderItem},
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderUuid},
        },
        products::records::ProductUuid,
        users::records::{AddressUuid, UserUuid},
    },
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const LIST_USER_ORDERS_SQL: &str = include_str!("sql/list_user_orders.sql");
const SET_ORDER_STATUS_SQL: &str = include_str!("sql/set_order_status.sql");
const MARK_PAID_SQL: &str = include_str!("sql/mark_paid.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const LIST_ORDER_ITEMS_SQL: &str = include_str!("sql/list_order_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.user_uuid.into_uuid())
            .bind(order.address_uuid.into_uuid())
            .bind(order.destination_region.as_str())
            .bind(&order.destination_address)
            .bind(order.payment_method.to_str())
            .bind(order.paid)
            .bind(order.status.to_str())
            .bind(db_amount(order.totals.subtotal, "subtotal")?)
            .bind(db_amount(order.totals.discount, "discount")?)
            .bind(db_amount(order.totals.delivery_fee, "delivery_fee")?)
            .bind(db_amount(order.totals.final_amount, "final_amount")?)
            .bind(order.coupon_uuid)
            .bind(order.confirmation_code.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock the order row; leg transitions and cancellation serialise on it.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_user_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_USER_ORDERS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<(), sqlx::Error> {
        query(SET_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.to_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Returns `false` when the order was already paid.
    pub(crate) async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(MARK_PAID_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    pub(crate) async fn create_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &NewOrderItem,
    ) -> Result<OrderItemRecord, sqlx::Error> {
        query_as::<Postgres, OrderItemRecord>(CREATE_ORDER_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(item.order_uuid.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(item.supplier_uuid.into_uuid())
            .bind(db_count(item.quantity, "quantity")?)
            .bind(db_amount(item.unit_price, "unit_price")?)
            .bind(db_amount(item.discount, "discount")?)
            .bind(item.color.as_deref())
            .bind(item.size.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        query_as::<Postgres, OrderItemRecord>(LIST_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let totals = Totals {
            subtotal: try_get_amount(row, "subtotal")?,
            discount: try_get_amount(row, "discount")?,
            delivery_fee: try_get_amount(row, "delivery_fee")?,
            final_amount: try_get_amount(row, "final_amount")?,
        };

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            address_uuid: AddressUuid::from_uuid(row.try_get("address_uuid")?),
            destination_region: Region::from(row.try_get::<String, _>("destination_region")?),
            destination_address: row.try_get("destination_address")?,
            payment_method: try_get_parsed(row, "payment_method")?,
            paid: row.try_get("paid")?,
            status: try_get_parsed(row, "status")?,
            totals,
            coupon_uuid: row.try_get("coupon_uuid")?,
            confirmation_code: ConfirmationCode::from(
                row.try_get::<String, _>("confirmation_code")?,
            ),
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            supplier_uuid: UserUuid::from_uuid(row.try_get("supplier_uuid")?),
            quantity: try_get_count(row, "quantity")?,
            unit_price: try_get_amount(row, "unit_price")?,
            discount: try_get_amount(row, "discount")?,
            color: row.try_get("color")?,
            size: row.try_get("size")?,
        })
    }
}
