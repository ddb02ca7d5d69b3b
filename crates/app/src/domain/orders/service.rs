//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use souq::{actors::Actor, ledger::RelatedObject};

use crate::{
    database::Db,
    domain::{
        orders::{
            errors::OrdersServiceError,
            lifecycle::OrderLifecycle,
            records::{OrderDetails, OrderRecord, OrderUuid},
            repository::PgOrdersRepository,
        },
        shipments::repository::PgShipmentsRepository,
    },
    notifications::{Notification, NotificationQueue},
    settings::SettlementSettings,
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    shipments: PgShipmentsRepository,
    lifecycle: OrderLifecycle,
    notifications: NotificationQueue,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, settlement: &SettlementSettings, notifications: NotificationQueue) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            shipments: PgShipmentsRepository::new(),
            lifecycle: OrderLifecycle::new(settlement.policy()),
            notifications,
        }
    }
}

fn ensure_buyer(actor: &Actor, order: &OrderRecord) -> Result<(), OrdersServiceError> {
    if actor.is_or_admin(order.user_uuid.into_uuid()) {
        Ok(())
    } else {
        Err(OrdersServiceError::Forbidden)
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn get_order(
        &self,
        actor: &Actor,
        order: OrderUuid,
    ) -> Result<OrderDetails, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order = self.orders.get_order(&mut tx, order).await?;

        ensure_buyer(actor, &order)?;

        let items = self.orders.list_order_items(&mut tx, order.uuid).await?;
        let shipments = self
            .shipments
            .list_order_shipments(&mut tx, order.uuid)
            .await?;

        tx.commit().await?;

        Ok(OrderDetails {
            order,
            items,
            shipments,
        })
    }

    async fn list_orders(&self, actor: &Actor) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let orders = self
            .orders
            .list_user_orders(&mut tx, actor.user.into())
            .await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.cancel_order",
        skip(self, actor),
        fields(order_uuid = %order, cancelled),
        err
    )]
    async fn cancel_order(
        &self,
        actor: &Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let locked = self.orders.lock_order(&mut tx, order).await?;

        ensure_buyer(actor, &locked)?;

        let cancelled = self.lifecycle.cancel(&mut tx, &locked).await?;
        let order = self.orders.get_order(&mut tx, order).await?;

        tx.commit().await?;

        Span::current().record("cancelled", cancelled);

        if cancelled {
            info!(order_uuid = %order.uuid, "cancelled order");

            self.notifications.enqueue(
                Notification::new(order.user_uuid.into_uuid(), "Your order has been cancelled")
                    .about(RelatedObject::Order(order.uuid.into_uuid())),
            );
        }

        Ok(order)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// An order with its items and legs, visible to the buyer and admins.
    async fn get_order(
        &self,
        actor: &Actor,
        order: OrderUuid,
    ) -> Result<OrderDetails, OrdersServiceError>;

    /// The actor's own orders, newest first.
    async fn list_orders(&self, actor: &Actor) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Cancel an order whose legs have not been picked up.
    ///
    /// Cancelling an already cancelled order succeeds without side effects.
    async fn cancel_order(
        &self,
        actor: &Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use souq::{
        actors::Role,
        orders::{OrderError, OrderStatus, PaymentMethod},
        shipments::ShipmentStatus,
    };

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn cancelling_restores_stock_and_reverses_cashback() -> TestResult {
        let ctx = TestContext::new().await;
        let placed = ctx
            .place_order("Cairo", "Cairo", PaymentMethod::Balance, 20_000)
            .await?;
        let buyer = ctx.actor(placed.customer, Role::Customer);

        let cancelled = ctx.orders.cancel_order(&buyer, placed.order.uuid).await?;
        let details = ctx.orders.get_order(&buyer, placed.order.uuid).await?;
        let product = ctx.products.get_product(placed.product).await?;
        let balance = ctx.ledger.balance(&buyer, placed.customer).await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(
            details
                .shipments
                .iter()
                .all(|s| s.status == ShipmentStatus::Cancelled),
            "every leg should be cancelled"
        );
        assert_eq!(product.stock, 10, "stock should be restored");
        assert_eq!(balance.balance, 20_000, "refund and reversal should net out");

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_twice_is_a_no_op() -> TestResult {
        let ctx = TestContext::new().await;
        let placed = ctx
            .place_order("Cairo", "Cairo", PaymentMethod::CashOnDelivery, 0)
            .await?;
        let buyer = ctx.actor(placed.customer, Role::Customer);

        ctx.orders.cancel_order(&buyer, placed.order.uuid).await?;
        let again = ctx.orders.cancel_order(&buyer, placed.order.uuid).await?;
        let balance = ctx.ledger.balance(&buyer, placed.customer).await?;

        assert_eq!(again.status, OrderStatus::Cancelled);
        assert_eq!(balance.balance, 0, "cashback reversed exactly once");

        Ok(())
    }

    #[tokio::test]
    async fn orders_in_transit_cannot_be_cancelled() -> TestResult {
        let ctx = TestContext::new().await;
        let placed = ctx
            .place_order("Cairo", "Cairo", PaymentMethod::CashOnDelivery, 0)
            .await?;
        let courier = ctx.courier("Cairo").await?;
        let leg = ctx.first_leg(placed.order.uuid).await?;

        ctx.shipments
            .mark_ready(&ctx.actor(placed.supplier, Role::Supplier), leg)
            .await?;
        ctx.shipments.accept(&courier, leg).await?;

        let result = ctx
            .orders
            .cancel_order(&ctx.actor(placed.customer, Role::Customer), placed.order.uuid)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Order(OrderError::NotCancellable(
                    ShipmentStatus::OnMyWay
                )))
            ),
            "expected not cancellable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn strangers_cannot_see_an_order() -> TestResult {
        let ctx = TestContext::new().await;
        let placed = ctx
            .place_order("Cairo", "Giza", PaymentMethod::CashOnDelivery, 0)
            .await?;
        let stranger = ctx.customer().await?;

        let result = ctx
            .orders
            .get_order(&ctx.actor(stranger, Role::Customer), placed.order.uuid)
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Forbidden)),
            "expected forbidden, got {result:?}"
        );

        Ok(())
    }
}
