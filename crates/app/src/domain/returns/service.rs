//! Returns service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use souq::{
    actors::Actor,
    ledger::RelatedObject,
    pricing::FeeSchedule,
    regions::WarehouseDirectory,
    returns::ensure_reviewer,
    routing::{Direction, Stop, plan_legs},
    shipments::ConfirmationCode,
};

use crate::{
    database::Db,
    domain::{
        orders::repository::PgOrdersRepository,
        returns::{
            data::{NewReturnRequest, OpenReturn},
            errors::ReturnsServiceError,
            records::{ReturnDetails, ReturnRequestRecord, ReturnRequestUuid},
            repository::PgReturnsRepository,
        },
        shipments::{records::ShipmentOwner, repository::PgShipmentsRepository},
        users::repository::PgUsersRepository,
        warehouses::repository::PgWarehousesRepository,
    },
    notifications::{Notification, NotificationQueue},
    settings::SettlementSettings,
};

#[derive(Debug, Clone)]
pub struct PgReturnsService {
    db: Db,
    returns: PgReturnsRepository,
    orders: PgOrdersRepository,
    shipments: PgShipmentsRepository,
    users: PgUsersRepository,
    warehouses: PgWarehousesRepository,
    fees: FeeSchedule,
    notifications: NotificationQueue,
}

impl PgReturnsService {
    #[must_use]
    pub fn new(db: Db, settlement: &SettlementSettings, notifications: NotificationQueue) -> Self {
        Self {
            db,
            returns: PgReturnsRepository::new(),
            orders: PgOrdersRepository::new(),
            shipments: PgShipmentsRepository::new(),
            users: PgUsersRepository::new(),
            warehouses: PgWarehousesRepository::new(),
            fees: settlement.fees,
            notifications,
        }
    }
}

fn ensure_party(actor: &Actor, request: &ReturnRequestRecord) -> Result<(), ReturnsServiceError> {
    let party = actor.user == request.customer_uuid.into_uuid()
        || actor.user == request.supplier_uuid.into_uuid();

    if party || actor.is_admin() {
        Ok(())
    } else {
        Err(ReturnsServiceError::Forbidden)
    }
}

#[async_trait]
impl ReturnsService for PgReturnsService {
    #[tracing::instrument(
        name = "returns.service.open_return",
        skip(self, actor, request),
        fields(order_item_uuid = %request.order_item_uuid, quantity = request.quantity, return_uuid),
        err
    )]
    async fn open_return(
        &self,
        actor: &Actor,
        request: OpenReturn,
    ) -> Result<ReturnRequestRecord, ReturnsServiceError> {
        let mut tx = self.db.begin().await?;

        let locked = self
            .returns
            .lock_returnable_line(&mut tx, request.order_item_uuid)
            .await?;

        let amount = locked.line.open(actor, request.quantity)?;

        let created = self
            .returns
            .create_return_request(
                &mut tx,
                &NewReturnRequest {
                    uuid: ReturnRequestUuid::new(),
                    order_item_uuid: request.order_item_uuid,
                    customer_uuid: actor.user.into(),
                    supplier_uuid: locked.supplier_uuid,
                    quantity: request.quantity,
                    amount,
                    reason: request.reason,
                    confirmation_code: ConfirmationCode::generate(),
                },
            )
            .await?;

        tx.commit().await?;

        Span::current().record("return_uuid", created.uuid.to_string());
        info!(return_uuid = %created.uuid, "opened return");

        self.notifications.enqueue(
            Notification::new(
                created.supplier_uuid.into_uuid(),
                "A customer asked to return an item",
            )
            .about(RelatedObject::ReturnRequest(created.uuid.into_uuid())),
        );

        Ok(created)
    }

    async fn get_return(
        &self,
        actor: &Actor,
        request: ReturnRequestUuid,
    ) -> Result<ReturnDetails, ReturnsServiceError> {
        let mut tx = self.db.begin().await?;

        let request = self.returns.get_return_request(&mut tx, request).await?;

        ensure_party(actor, &request)?;

        let shipments = self
            .shipments
            .list_return_shipments(&mut tx, request.uuid)
            .await?;

        tx.commit().await?;

        Ok(ReturnDetails { request, shipments })
    }

    async fn list_returns(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ReturnRequestRecord>, ReturnsServiceError> {
        let mut tx = self.db.begin().await?;

        let requests = self
            .returns
            .list_user_returns(&mut tx, actor.user.into())
            .await?;

        tx.commit().await?;

        Ok(requests)
    }

    #[tracing::instrument(
        name = "returns.service.approve_return",
        skip(self, actor),
        fields(return_uuid = %request, legs),
        err
    )]
    async fn approve_return(
        &self,
        actor: &Actor,
        request: ReturnRequestUuid,
    ) -> Result<ReturnDetails, ReturnsServiceError> {
        let mut tx = self.db.begin().await?;

        let locked = self.returns.lock_return_request(&mut tx, request).await?;

        ensure_reviewer(actor, locked.supplier_uuid.into_uuid(), "approve")?;

        let status = locked.status.approve()?;
        let order = self.orders.get_order(&mut tx, locked.order_uuid).await?;

        let supplier_address = self
            .users
            .get_primary_address(&mut tx, locked.supplier_uuid)
            .await?
            .ok_or(ReturnsServiceError::NoSupplierAddress)?;

        let directory =
            WarehouseDirectory::new(self.warehouses.list_warehouses(&mut tx).await?)?;

        let plans = plan_legs(
            &directory,
            Direction::Return,
            &Stop::supplier(
                locked.supplier_uuid.into_uuid(),
                supplier_address.region,
                supplier_address.line,
            ),
            &Stop::customer(
                locked.customer_uuid.into_uuid(),
                order.destination_region,
                order.destination_address,
            ),
            self.fees.cross_region_surcharge,
        )?;

        let shipments = self
            .shipments
            .create_legs(
                &mut tx,
                ShipmentOwner::Return(locked.uuid),
                Direction::Return,
                locked.supplier_uuid,
                plans,
                locked.amount,
                &[(locked.order_item_uuid, locked.quantity)],
            )
            .await?;

        self.returns.set_status(&mut tx, request, status).await?;

        let request = self.returns.get_return_request(&mut tx, request).await?;

        tx.commit().await?;

        Span::current().record("legs", shipments.len());
        info!(return_uuid = %request.uuid, "approved return");

        self.notifications.enqueue_all([
            Notification::new(
                request.customer_uuid.into_uuid(),
                "Your return was approved, hand the item to the courier",
            )
            .about(RelatedObject::ReturnRequest(request.uuid.into_uuid())),
            Notification::new(
                request.supplier_uuid.into_uuid(),
                format!(
                    "Give code {} to the courier when the returned item arrives",
                    request.confirmation_code.as_str()
                ),
            )
            .about(RelatedObject::ReturnRequest(request.uuid.into_uuid())),
        ]);

        Ok(ReturnDetails { request, shipments })
    }

    #[tracing::instrument(
        name = "returns.service.reject_return",
        skip(self, actor),
        fields(return_uuid = %request),
        err
    )]
    async fn reject_return(
        &self,
        actor: &Actor,
        request: ReturnRequestUuid,
    ) -> Result<ReturnRequestRecord, ReturnsServiceError> {
        let mut tx = self.db.begin().await?;

        let locked = self.returns.lock_return_request(&mut tx, request).await?;

        ensure_reviewer(actor, locked.supplier_uuid.into_uuid(), "reject")?;

        let status = locked.status.reject()?;

        self.returns.set_status(&mut tx, request, status).await?;

        let request = self.returns.get_return_request(&mut tx, request).await?;

        tx.commit().await?;

        info!(return_uuid = %request.uuid, "rejected return");

        self.notifications.enqueue(
            Notification::new(
                request.customer_uuid.into_uuid(),
                "Your return request was rejected",
            )
            .about(RelatedObject::ReturnRequest(request.uuid.into_uuid())),
        );

        Ok(request)
    }
}

#[automock]
#[async_trait]
pub trait ReturnsService: Send + Sync {
    /// Customer opens a return against a delivered order line.
    async fn open_return(
        &self,
        actor: &Actor,
        request: OpenReturn,
    ) -> Result<ReturnRequestRecord, ReturnsServiceError>;

    /// A return with its legs, visible to its customer, supplier and admins.
    async fn get_return(
        &self,
        actor: &Actor,
        request: ReturnRequestUuid,
    ) -> Result<ReturnDetails, ReturnsServiceError>;

    /// Returns the actor opened or received.
    async fn list_returns(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ReturnRequestRecord>, ReturnsServiceError>;

    /// Supplier accepts the return and the legs back to them are created.
    async fn approve_return(
        &self,
        actor: &Actor,
        request: ReturnRequestUuid,
    ) -> Result<ReturnDetails, ReturnsServiceError>;

    /// Supplier declines the return.
    async fn reject_return(
        &self,
        actor: &Actor,
        request: ReturnRequestUuid,
    ) -> Result<ReturnRequestRecord, ReturnsServiceError>;
}
