//! Shipments service.
//!
//! Every action locks the owning order (or return request) before the leg itself, the same order
//! used by cancellation, so concurrent actions on one order serialise instead of deadlocking.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use souq::{
    actors::Actor,
    ledger::{LedgerError, RelatedObject, SettlementPolicy},
    money::{display_amount, signed},
    orders::PaymentMethod,
    routing::{Party, Stop},
    shipments::{ConfirmationCode, ShipmentError, ShipmentStatus},
};

use crate::{
    database::Db,
    domain::{
        ledger::repository::PgLedgerRepository,
        orders::{lifecycle::OrderLifecycle, records::OrderRecord, repository::PgOrdersRepository},
        products::repository::PgProductsRepository,
        returns::{records::ReturnRequestRecord, repository::PgReturnsRepository},
        shipments::{
            errors::ShipmentsServiceError,
            records::{ShipmentOwner, ShipmentRecord, ShipmentUuid},
            repository::PgShipmentsRepository,
        },
    },
    notifications::{Notification, NotificationQueue},
    settings::SettlementSettings,
};

/// The locked row a leg moves goods for.
#[derive(Debug)]
enum Owner {
    Order(OrderRecord),
    Return(ReturnRequestRecord),
}

impl Owner {
    fn confirmation_code(&self) -> &ConfirmationCode {
        match self {
            Self::Order(order) => &order.confirmation_code,
            Self::Return(request) => &request.confirmation_code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgShipmentsService {
    db: Db,
    shipments: PgShipmentsRepository,
    orders: PgOrdersRepository,
    returns: PgReturnsRepository,
    products: PgProductsRepository,
    ledger: PgLedgerRepository,
    lifecycle: OrderLifecycle,
    policy: SettlementPolicy,
    currency: String,
    notifications: NotificationQueue,
}

impl PgShipmentsService {
    #[must_use]
    pub fn new(db: Db, settlement: &SettlementSettings, notifications: NotificationQueue) -> Self {
        Self {
            db,
            shipments: PgShipmentsRepository::new(),
            orders: PgOrdersRepository::new(),
            returns: PgReturnsRepository::new(),
            products: PgProductsRepository::new(),
            ledger: PgLedgerRepository::new(),
            lifecycle: OrderLifecycle::new(settlement.policy()),
            policy: settlement.policy(),
            currency: settlement.currency.clone(),
            notifications,
        }
    }

    /// Lock the owner, then the leg.
    async fn lock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shipment: ShipmentUuid,
    ) -> Result<(Owner, ShipmentRecord), ShipmentsServiceError> {
        let current = self.shipments.get_shipment(tx, shipment).await?;

        let owner = match current.owner {
            ShipmentOwner::Order(order) => Owner::Order(self.orders.lock_order(tx, order).await?),
            ShipmentOwner::Return(request) => {
                Owner::Return(self.returns.lock_return_request(tx, request).await?)
            }
        };

        let locked = self.shipments.lock_shipment(tx, shipment).await?;

        Ok((owner, locked))
    }

    /// Settle and propagate a leg that just moved to `status`.
    async fn settle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &Owner,
        shipment: &ShipmentRecord,
        status: ShipmentStatus,
    ) -> Result<Vec<Notification>, ShipmentsServiceError> {
        let mut notifications = Vec::new();

        if let Some(courier) = shipment.delivery_person_uuid.filter(|_| status.is_completed()) {
            let payout = self.policy.delivery_payout(
                courier.into_uuid(),
                shipment.uuid.into_uuid(),
                shipment.fee,
            )?;

            self.ledger.post_all(tx, payout.iter()).await?;

            if let Some(earned) = payout.first().filter(|p| p.user == courier.into_uuid()) {
                notifications.push(
                    Notification::new(
                        courier.into_uuid(),
                        format!("You earned {}", display_amount(earned.amount, &self.currency)),
                    )
                    .about(RelatedObject::Shipment(shipment.uuid.into_uuid())),
                );
            }
        }

        if status == ShipmentStatus::DeliveredToWarehouse {
            if let Some(next) = self.shipments.lock_next_leg(tx, shipment).await? {
                let released = next.leg().release()?;

                self.shipments.set_status(tx, next.uuid, released).await?;
            }
        }

        match owner {
            Owner::Order(order) => {
                if status == ShipmentStatus::DeliveredSuccessfully {
                    if let Some(sale) = self.policy.sale(
                        shipment.supplier_uuid.into_uuid(),
                        order.uuid.into_uuid(),
                        shipment.goods_value,
                    )? {
                        self.ledger.post(tx, &sale).await?;
                    }

                    if order.payment_method == PaymentMethod::CashOnDelivery {
                        self.orders.mark_paid(tx, order.uuid).await?;
                    }
                }

                let order_status = self.lifecycle.refresh_status(tx, order).await?;

                if order_status != order.status {
                    notifications.push(
                        Notification::new(
                            order.user_uuid.into_uuid(),
                            format!("Your order is now {order_status}"),
                        )
                        .about(RelatedObject::Order(order.uuid.into_uuid())),
                    );
                }
            }
            Owner::Return(request) => match status {
                ShipmentStatus::DeliveredSuccessfully => {
                    let postings = self.policy.return_settlement(
                        request.customer_uuid.into_uuid(),
                        request.supplier_uuid.into_uuid(),
                        request.uuid.into_uuid(),
                        request.amount,
                    )?;

                    self.ledger.post_all(tx, postings.iter()).await?;
                    self.products
                        .restock(tx, request.product_uuid, request.quantity)
                        .await?;
                    self.returns
                        .set_status(tx, request.uuid, request.status.complete()?)
                        .await?;

                    notifications.push(
                        Notification::new(
                            request.customer_uuid.into_uuid(),
                            format!(
                                "Your return was received, {} credited",
                                display_amount(
                                    signed(request.amount).map_err(LedgerError::from)?,
                                    &self.currency
                                )
                            ),
                        )
                        .about(RelatedObject::ReturnRequest(request.uuid.into_uuid())),
                    );
                }
                ShipmentStatus::FailedDelivery => {
                    self.returns
                        .set_status(tx, request.uuid, request.status.fail()?)
                        .await?;
                }
                _ => {}
            },
        }

        Ok(notifications)
    }

    async fn finish(
        &self,
        mut tx: Transaction<'static, Postgres>,
        shipment: ShipmentUuid,
        notifications: Vec<Notification>,
    ) -> Result<ShipmentRecord, ShipmentsServiceError> {
        let updated = self.shipments.get_shipment(&mut tx, shipment).await?;

        tx.commit().await?;

        Span::current().record("status", updated.status.to_str());
        info!(shipment_uuid = %updated.uuid, status = %updated.status, "shipment moved");

        self.notifications.enqueue_all(notifications);

        Ok(updated)
    }
}

fn involves(actor: &Actor, stop: &Stop) -> bool {
    match stop.party {
        Party::Supplier(user) | Party::Customer(user) => user == actor.user,
        Party::Warehouse(_) => false,
    }
}

fn ensure_visible(actor: &Actor, shipment: &ShipmentRecord) -> Result<(), ShipmentsServiceError> {
    let holder = shipment.delivery_person_uuid.map(|p| p.into_uuid()) == Some(actor.user);
    let supplier = shipment.supplier_uuid.into_uuid() == actor.user;

    if actor.is_admin()
        || holder
        || supplier
        || involves(actor, &shipment.from)
        || involves(actor, &shipment.to)
    {
        Ok(())
    } else {
        Err(ShipmentsServiceError::Forbidden)
    }
}

#[async_trait]
impl ShipmentsService for PgShipmentsService {
    async fn get_shipment(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError> {
        let mut tx = self.db.begin().await?;

        let shipment = self.shipments.get_shipment(&mut tx, shipment).await?;

        tx.commit().await?;

        ensure_visible(actor, &shipment)?;

        Ok(shipment)
    }

    async fn list_available(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ShipmentRecord>, ShipmentsServiceError> {
        let region = actor
            .region
            .as_ref()
            .ok_or(ShipmentsServiceError::NoServicedRegion)?;

        let mut tx = self.db.begin().await?;

        let shipments = self.shipments.list_available(&mut tx, region).await?;

        tx.commit().await?;

        Ok(shipments)
    }

    #[tracing::instrument(
        name = "shipments.service.mark_ready",
        skip(self, actor),
        fields(shipment_uuid = %shipment, status),
        err
    )]
    async fn mark_ready(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError> {
        let mut tx = self.db.begin().await?;

        let (owner, locked) = self.lock(&mut tx, shipment).await?;
        let status = locked.leg().mark_ready(actor)?;

        self.shipments.set_status(&mut tx, shipment, status).await?;

        let notifications = self.settle(&mut tx, &owner, &locked, status).await?;

        self.finish(tx, shipment, notifications).await
    }

    #[tracing::instrument(
        name = "shipments.service.accept",
        skip(self, actor),
        fields(shipment_uuid = %shipment, delivery_person = %actor.user, status),
        err
    )]
    async fn accept(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError> {
        let mut tx = self.db.begin().await?;

        let (owner, locked) = self.lock(&mut tx, shipment).await?;
        let status = locked.leg().accept(actor)?;

        if !self
            .shipments
            .claim(&mut tx, shipment, actor.user.into())
            .await?
        {
            return Err(ShipmentError::AlreadyTaken.into());
        }

        let notifications = self.settle(&mut tx, &owner, &locked, status).await?;

        self.finish(tx, shipment, notifications).await
    }

    #[tracing::instrument(
        name = "shipments.service.arrive_at_warehouse",
        skip(self, actor),
        fields(shipment_uuid = %shipment, status),
        err
    )]
    async fn arrive_at_warehouse(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError> {
        let mut tx = self.db.begin().await?;

        let (owner, locked) = self.lock(&mut tx, shipment).await?;
        let status = locked.leg().arrive_at_warehouse(actor)?;

        self.shipments.set_status(&mut tx, shipment, status).await?;

        let notifications = self.settle(&mut tx, &owner, &locked, status).await?;

        self.finish(tx, shipment, notifications).await
    }

    #[tracing::instrument(
        name = "shipments.service.confirm_delivery",
        skip(self, actor, code),
        fields(shipment_uuid = %shipment, status),
        err
    )]
    async fn confirm_delivery(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
        code: &str,
    ) -> Result<ShipmentRecord, ShipmentsServiceError> {
        let mut tx = self.db.begin().await?;

        let (owner, locked) = self.lock(&mut tx, shipment).await?;
        let status = locked
            .leg()
            .confirm_delivery(actor, owner.confirmation_code(), code)?;

        self.shipments.set_status(&mut tx, shipment, status).await?;

        let notifications = self.settle(&mut tx, &owner, &locked, status).await?;

        self.finish(tx, shipment, notifications).await
    }

    #[tracing::instrument(
        name = "shipments.service.fail_delivery",
        skip(self, actor),
        fields(shipment_uuid = %shipment, status),
        err
    )]
    async fn fail_delivery(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError> {
        let mut tx = self.db.begin().await?;

        let (owner, locked) = self.lock(&mut tx, shipment).await?;
        let status = locked.leg().fail_delivery(actor)?;

        self.shipments.set_status(&mut tx, shipment, status).await?;

        let notifications = self.settle(&mut tx, &owner, &locked, status).await?;

        self.finish(tx, shipment, notifications).await
    }
}

#[automock]
#[async_trait]
pub trait ShipmentsService: Send + Sync {
    /// A single leg, visible to its parties, holder and admins.
    async fn get_shipment(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError>;

    /// Unclaimed legs departing from the delivery person's serviced region.
    async fn list_available(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ShipmentRecord>, ShipmentsServiceError>;

    /// Sending supplier or customer hands the goods over for pickup.
    async fn mark_ready(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError>;

    /// Delivery person claims a ready leg. Exactly one concurrent claim wins.
    async fn accept(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError>;

    /// Holder drops a first leg at the intermediate warehouse, releasing the onward leg.
    async fn arrive_at_warehouse(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError>;

    /// Holder hands the goods to the recipient against their confirmation code.
    async fn confirm_delivery(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
        code: &str,
    ) -> Result<ShipmentRecord, ShipmentsServiceError>;

    /// Holder reports the recipient could not be reached.
    async fn fail_delivery(
        &self,
        actor: &Actor,
        shipment: ShipmentUuid,
    ) -> Result<ShipmentRecord, ShipmentsServiceError>;
}
