//! Checkout service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, info};

use souq::{
    actors::{Actor, Role},
    orders::PaymentMethod,
    pricing::Quote,
};

use crate::{
    database::Db,
    domain::{
        carts::repositories::PgCartsRepository,
        checkout::{
            assembler::{Assembler, Assembly, LineSource},
            cache::QuoteCache,
            data::{Checkout, CheckoutOutcome},
            errors::CheckoutServiceError,
        },
        payments::{data::NewPayment, records::PaymentUuid, repository::PgPaymentsRepository},
        users::records::AddressUuid,
    },
    notifications::NotificationQueue,
    settings::{CheckoutSettings, SettlementSettings},
};

#[derive(Debug, Clone)]
pub struct PgCheckoutService {
    db: Db,
    carts: PgCartsRepository,
    payments: PgPaymentsRepository,
    assembler: Assembler,
    cache: QuoteCache,
    notifications: NotificationQueue,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(
        db: Db,
        settlement: &SettlementSettings,
        checkout: CheckoutSettings,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            db,
            carts: PgCartsRepository::new(),
            payments: PgPaymentsRepository::new(),
            assembler: Assembler::new(settlement.policy(), settlement.currency.clone()),
            cache: QuoteCache::new(checkout.quote_ttl),
            notifications,
        }
    }
}

fn ensure_customer(actor: &Actor) -> Result<(), CheckoutServiceError> {
    if actor.role == Role::Customer {
        Ok(())
    } else {
        Err(CheckoutServiceError::Forbidden)
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    async fn quote(
        &self,
        actor: &Actor,
        address: AddressUuid,
        coupon_code: Option<String>,
    ) -> Result<Quote, CheckoutServiceError> {
        ensure_customer(actor)?;

        let now = Timestamp::now();
        let mut tx = self.db.begin().await?;

        let cart = self.carts.ensure_cart(&mut tx, actor.user.into()).await?;

        if let Some(quote) = self
            .cache
            .get(cart.uuid, address, coupon_code.as_deref(), now)
            .await
        {
            tx.commit().await?;

            return Ok(quote);
        }

        let priced = self
            .assembler
            .price(
                &mut tx,
                actor.user.into(),
                LineSource::Cart,
                address,
                coupon_code.as_deref(),
                false,
                now,
            )
            .await?;

        tx.commit().await?;

        self.cache
            .put(
                cart.uuid,
                address,
                coupon_code.as_deref(),
                now,
                priced.quote.clone(),
            )
            .await;

        Ok(priced.quote)
    }

    #[tracing::instrument(
        name = "checkout.service.place_order",
        skip(self, actor, checkout),
        fields(
            user_uuid = %actor.user,
            payment_method = checkout.payment_method.to_str(),
            order_uuid,
            payment_uuid
        ),
        err
    )]
    async fn place_order(
        &self,
        actor: &Actor,
        checkout: Checkout,
    ) -> Result<CheckoutOutcome, CheckoutServiceError> {
        ensure_customer(actor)?;

        let now = Timestamp::now();
        let mut tx = self.db.begin().await?;

        if checkout.payment_method == PaymentMethod::CreditCard {
            let priced = self
                .assembler
                .price(
                    &mut tx,
                    actor.user.into(),
                    LineSource::Cart,
                    checkout.address_uuid,
                    checkout.coupon_code.as_deref(),
                    false,
                    now,
                )
                .await?;

            let payment = self
                .payments
                .create_payment(
                    &mut tx,
                    &NewPayment {
                        uuid: PaymentUuid::new(),
                        user_uuid: actor.user.into(),
                        address_uuid: checkout.address_uuid,
                        coupon_code: checkout.coupon_code.clone(),
                        amount: priced.quote.totals.final_amount,
                    },
                )
                .await?;

            self.payments
                .create_payment_lines(&mut tx, payment.uuid, &priced.lines)
                .await?;

            tx.commit().await?;

            Span::current().record("payment_uuid", payment.uuid.to_string());

            info!(
                payment_uuid = %payment.uuid,
                amount = payment.amount,
                "awaiting card payment"
            );

            return Ok(CheckoutOutcome::PaymentPending(payment));
        }

        let (order, notifications) = self
            .assembler
            .assemble(
                &mut tx,
                Assembly {
                    user: actor.user.into(),
                    address: checkout.address_uuid,
                    coupon_code: checkout.coupon_code.as_deref(),
                    payment_method: checkout.payment_method,
                    lines: LineSource::Cart,
                    prepaid: false,
                    now,
                },
            )
            .await?;

        tx.commit().await?;

        Span::current().record("order_uuid", order.uuid.to_string());

        info!(
            order_uuid = %order.uuid,
            final_amount = order.totals.final_amount,
            "placed order"
        );

        self.notifications.enqueue_all(notifications);

        Ok(CheckoutOutcome::Order(order))
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Price the customer's cart for an address, served from a short-lived cache.
    async fn quote(
        &self,
        actor: &Actor,
        address: AddressUuid,
        coupon_code: Option<String>,
    ) -> Result<Quote, CheckoutServiceError>;

    /// Turn the customer's cart into an order, or into a pending card payment.
    ///
    /// Everything is re-validated inside one transaction; on any error nothing is written.
    async fn place_order(
        &self,
        actor: &Actor,
        checkout: Checkout,
    ) -> Result<CheckoutOutcome, CheckoutServiceError>;
}
