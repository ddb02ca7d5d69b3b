//! Order lifecycle steps shared by the orders, shipments and payments services.
//!
//! Callers hold the order row lock before invoking any of these.

use sqlx::{Postgres, Transaction};

use souq::{
    ledger::{RelatedObject, SettlementPolicy, TransactionType},
    money::Amount,
    orders::{LegState, OrderStatus, derive_status, ensure_cancellable},
    shipments::ShipmentStatus,
};

use crate::domain::{
    ledger::repository::PgLedgerRepository,
    orders::{errors::OrdersServiceError, records::OrderRecord, repository::PgOrdersRepository},
    products::repository::PgProductsRepository,
    shipments::repository::PgShipmentsRepository,
};

#[derive(Debug, Clone)]
pub(crate) struct OrderLifecycle {
    orders: PgOrdersRepository,
    shipments: PgShipmentsRepository,
    products: PgProductsRepository,
    ledger: PgLedgerRepository,
    policy: SettlementPolicy,
}

impl OrderLifecycle {
    #[must_use]
    pub(crate) fn new(policy: SettlementPolicy) -> Self {
        Self {
            orders: PgOrdersRepository::new(),
            shipments: PgShipmentsRepository::new(),
            products: PgProductsRepository::new(),
            ledger: PgLedgerRepository::new(),
            policy,
        }
    }

    /// Recompute the order status from its outbound legs, storing it when it moved forward.
    pub(crate) async fn refresh_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &OrderRecord,
    ) -> Result<OrderStatus, sqlx::Error> {
        let legs = self.shipments.list_order_shipments(tx, order.uuid).await?;

        let states: Vec<LegState> = legs
            .iter()
            .map(|shipment| LegState {
                status: shipment.status,
                ends_at_warehouse: shipment.leg().ends_at_warehouse(),
            })
            .collect();

        let status = order.status.advance(derive_status(&states));

        if status != order.status {
            self.orders.set_status(tx, order.uuid, status).await?;
        }

        Ok(status)
    }

    /// Cancel every leg, restore stock, refund a paid order and reverse its cashback.
    ///
    /// Returns `false` for an order that was already cancelled.
    pub(crate) async fn cancel(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &OrderRecord,
    ) -> Result<bool, OrdersServiceError> {
        if order.status == OrderStatus::Cancelled {
            return Ok(false);
        }

        let legs = self.shipments.list_order_shipments(tx, order.uuid).await?;
        let statuses: Vec<ShipmentStatus> = legs.iter().map(|leg| leg.status).collect();

        ensure_cancellable(&statuses)?;

        for shipment in &legs {
            if shipment.status != ShipmentStatus::Cancelled {
                let status = shipment.leg().cancel()?;

                self.shipments.set_status(tx, shipment.uuid, status).await?;
            }
        }

        for item in self.orders.list_order_items(tx, order.uuid).await? {
            self.products
                .restock(tx, item.product_uuid, item.quantity)
                .await?;
        }

        let buyer = order.user_uuid.into_uuid();
        let related = RelatedObject::Order(order.uuid.into_uuid());

        let cashback = self
            .ledger
            .sum_posted(tx, buyer, TransactionType::Cashback, related)
            .await?;

        let postings = self.policy.cancellation(
            buyer,
            order.uuid.into_uuid(),
            order.paid.then_some(order.totals.final_amount),
            Amount::try_from(cashback).unwrap_or_default(),
        )?;

        self.ledger.post_all(tx, postings.iter()).await?;
        self.orders
            .set_status(tx, order.uuid, OrderStatus::Cancelled)
            .await?;

        Ok(true)
    }
}
