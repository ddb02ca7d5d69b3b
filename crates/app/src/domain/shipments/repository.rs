//! Shipments Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use souq::{
    money::Amount,
    regions::Region,
    routing::{Direction, LegPlan, Party, Stop},
    shipments::ShipmentStatus,
};

use crate::{
    database::{
        db_amount, db_count, try_get_amount, try_get_parsed, try_get_timestamp, unknown_value,
    },
    domain::{
        orders::records::{OrderItemUuid, OrderUuid},
        returns::records::ReturnRequestUuid,
        shipments::{
            data::NewShipment,
            records::{ShipmentOwner, ShipmentRecord, ShipmentUuid},
        },
        users::records::UserUuid,
    },
};

const CREATE_SHIPMENT_SQL: &str = include_str!("sql/create_shipment.sql");
const CREATE_SHIPMENT_ITEM_SQL: &str = include_str!("sql/create_shipment_item.sql");
const GET_SHIPMENT_SQL: &str = include_str!("sql/get_shipment.sql");
const LOCK_SHIPMENT_SQL: &str = include_str!("sql/lock_shipment.sql");
const LIST_ORDER_SHIPMENTS_SQL: &str = include_str!("sql/list_order_shipments.sql");
const LIST_RETURN_SHIPMENTS_SQL: &str = include_str!("sql/list_return_shipments.sql");
const LIST_AVAILABLE_SQL: &str = include_str!("sql/list_available.sql");
const LOCK_NEXT_LEG_SQL: &str = include_str!("sql/lock_next_leg.sql");
const CLAIM_SHIPMENT_SQL: &str = include_str!("sql/claim_shipment.sql");
const SET_SHIPMENT_STATUS_SQL: &str = include_str!("sql/set_shipment_status.sql");

fn party_columns(party: &Party) -> (&'static str, Option<Uuid>) {
    match party {
        Party::Supplier(user) => ("supplier", Some(*user)),
        Party::Customer(user) => ("customer", Some(*user)),
        Party::Warehouse(_) => ("warehouse", None),
    }
}

fn owner_columns(owner: ShipmentOwner) -> (Option<Uuid>, Option<Uuid>) {
    match owner {
        ShipmentOwner::Order(order) => (Some(order.into_uuid()), None),
        ShipmentOwner::Return(request) => (None, Some(request.into_uuid())),
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgShipmentsRepository;

impl PgShipmentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_shipment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shipment: &NewShipment,
    ) -> Result<ShipmentRecord, sqlx::Error> {
        let (order, return_request) = owner_columns(shipment.owner);
        let (from_kind, from_party) = party_columns(&shipment.plan.from.party);
        let (to_kind, to_party) = party_columns(&shipment.plan.to.party);

        query_as::<Postgres, ShipmentRecord>(CREATE_SHIPMENT_SQL)
            .bind(shipment.uuid.into_uuid())
            .bind(order)
            .bind(return_request)
            .bind(shipment.direction.to_str())
            .bind(i16::from(shipment.plan.sequence))
            .bind(shipment.supplier_uuid.into_uuid())
            .bind(from_kind)
            .bind(from_party)
            .bind(shipment.plan.from.region.as_str())
            .bind(&shipment.plan.from.address)
            .bind(to_kind)
            .bind(to_party)
            .bind(shipment.plan.to.region.as_str())
            .bind(&shipment.plan.to.address)
            .bind(db_amount(shipment.plan.fee, "fee")?)
            .bind(db_amount(shipment.goods_value, "goods_value")?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Persist planned legs, each carrying every listed order line.
    #[expect(clippy::too_many_arguments, reason = "one leg group per call")]
    pub(crate) async fn create_legs(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: ShipmentOwner,
        direction: Direction,
        supplier: UserUuid,
        plans: impl IntoIterator<Item = LegPlan>,
        goods_value: Amount,
        items: &[(OrderItemUuid, u32)],
    ) -> Result<Vec<ShipmentRecord>, sqlx::Error> {
        let mut created = Vec::new();

        for plan in plans {
            let shipment = self
                .create_shipment(
                    tx,
                    &NewShipment {
                        uuid: ShipmentUuid::new(),
                        owner,
                        direction,
                        supplier_uuid: supplier,
                        plan,
                        goods_value,
                    },
                )
                .await?;

            for (item, quantity) in items {
                self.add_item(tx, shipment.uuid, *item, *quantity).await?;
            }

            created.push(shipment);
        }

        Ok(created)
    }

    pub(crate) async fn add_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shipment: ShipmentUuid,
        item: OrderItemUuid,
        quantity: u32,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_SHIPMENT_ITEM_SQL)
            .bind(shipment.into_uuid())
            .bind(item.into_uuid())
            .bind(db_count(quantity, "quantity")?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn get_shipment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, sqlx::Error> {
        query_as::<Postgres, ShipmentRecord>(GET_SHIPMENT_SQL)
            .bind(shipment.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_shipment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, sqlx::Error> {
        query_as::<Postgres, ShipmentRecord>(LOCK_SHIPMENT_SQL)
            .bind(shipment.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_order_shipments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<ShipmentRecord>, sqlx::Error> {
        query_as::<Postgres, ShipmentRecord>(LIST_ORDER_SHIPMENTS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_return_shipments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: ReturnRequestUuid,
    ) -> Result<Vec<ShipmentRecord>, sqlx::Error> {
        query_as::<Postgres, ShipmentRecord>(LIST_RETURN_SHIPMENTS_SQL)
            .bind(request.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Unclaimed legs waiting for pickup in a region.
    pub(crate) async fn list_available(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        region: &Region,
    ) -> Result<Vec<ShipmentRecord>, sqlx::Error> {
        query_as::<Postgres, ShipmentRecord>(LIST_AVAILABLE_SQL)
            .bind(region.as_str())
            .fetch_all(&mut **tx)
            .await
    }

    /// The leg continuing from `previous`, locked for update.
    pub(crate) async fn lock_next_leg(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        previous: &ShipmentRecord,
    ) -> Result<Option<ShipmentRecord>, sqlx::Error> {
        let (order, return_request) = owner_columns(previous.owner);

        query_as::<Postgres, ShipmentRecord>(LOCK_NEXT_LEG_SQL)
            .bind(previous.uuid.into_uuid())
            .bind(i16::from(previous.sequence) + 1)
            .bind(previous.supplier_uuid.into_uuid())
            .bind(order)
            .bind(return_request)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Assign a delivery person to an unclaimed, ready leg.
    ///
    /// Returns `false` when another delivery person got there first.
    pub(crate) async fn claim(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shipment: ShipmentUuid,
        delivery_person: UserUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(CLAIM_SHIPMENT_SQL)
            .bind(shipment.into_uuid())
            .bind(delivery_person.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shipment: ShipmentUuid,
        status: ShipmentStatus,
    ) -> Result<(), sqlx::Error> {
        query(SET_SHIPMENT_STATUS_SQL)
            .bind(shipment.into_uuid())
            .bind(status.to_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

fn try_get_direction(row: &PgRow) -> Result<Direction, sqlx::Error> {
    let direction: String = row.try_get("direction")?;

    match direction.as_str() {
        "outbound" => Ok(Direction::Outbound),
        "return" => Ok(Direction::Return),
        _ => Err(unknown_value("direction", direction)),
    }
}

fn try_get_stop(row: &PgRow, prefix: &str) -> Result<Stop, sqlx::Error> {
    let kind_col = format!("{prefix}_kind");
    let party_col = format!("{prefix}_party");

    let kind: String = row.try_get(kind_col.as_str())?;
    let party: Option<Uuid> = row.try_get(party_col.as_str())?;
    let region = Region::from(row.try_get::<String, _>(format!("{prefix}_region").as_str())?);

    let party = match (kind.as_str(), party) {
        ("supplier", Some(user)) => Party::Supplier(user),
        ("customer", Some(user)) => Party::Customer(user),
        ("warehouse", None) => Party::Warehouse(region.clone()),
        _ => return Err(unknown_value(&kind_col, kind)),
    };

    Ok(Stop {
        party,
        region,
        address: row.try_get(format!("{prefix}_address").as_str())?,
    })
}

impl<'r> FromRow<'r, PgRow> for ShipmentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let order: Option<Uuid> = row.try_get("order_uuid")?;
        let return_request: Option<Uuid> = row.try_get("return_request_uuid")?;

        let owner = match (order, return_request) {
            (Some(order), None) => ShipmentOwner::Order(OrderUuid::from_uuid(order)),
            (None, Some(request)) => ShipmentOwner::Return(ReturnRequestUuid::from_uuid(request)),
            _ => return Err(unknown_value("order_uuid", "ambiguous shipment owner")),
        };

        let sequence: i16 = row.try_get("sequence")?;

        Ok(Self {
            uuid: ShipmentUuid::from_uuid(row.try_get("uuid")?),
            owner,
            direction: try_get_direction(row)?,
            sequence: u8::try_from(sequence).map_err(|e| sqlx::Error::ColumnDecode {
                index: "sequence".to_string(),
                source: Box::new(e),
            })?,
            supplier_uuid: UserUuid::from_uuid(row.try_get("supplier_uuid")?),
            from: try_get_stop(row, "from")?,
            to: try_get_stop(row, "to")?,
            status: try_get_parsed::<ShipmentStatus>(row, "status")?,
            delivery_person_uuid: row
                .try_get::<Option<Uuid>, _>("delivery_person_uuid")?
                .map(UserUuid::from_uuid),
            fee: try_get_amount(row, "fee")?,
            goods_value: try_get_amount(row, "goods_value")?,
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}
