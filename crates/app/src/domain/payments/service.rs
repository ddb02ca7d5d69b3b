//! Payments service.
//!
//! Card checkouts leave a pending payment behind, carrying the lines and prices the buyer is
//! charged for. The gateway's webhook either fails it or captures it, and a captured payment is
//! assembled into an order from those lines in the same transaction that flips its status.
//! Captured money that cannot become an order goes back to the buyer's balance. Pending payments
//! that never hear back are expired by [`PaymentsService::sweep`].

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info, warn};

use souq::{
    actors::Actor,
    ledger::{RelatedObject, SettlementPolicy},
    orders::PaymentMethod,
};

use crate::{
    database::Db,
    domain::{
        checkout::assembler::{Assembler, Assembly, LineSource},
        ledger::repository::PgLedgerRepository,
        payments::{
            data::{PaymentEvent, PaymentEventType, SweepReport, WebhookOutcome},
            errors::PaymentsServiceError,
            records::{PaymentRecord, PaymentStatus, PaymentUuid},
            repository::PgPaymentsRepository,
            signature,
        },
    },
    errors::{Classify, ErrorKind},
    notifications::{Notification, NotificationQueue},
    settings::{PaymentSettings, SettlementSettings},
};

#[derive(Debug, Clone)]
pub struct PgPaymentsService {
    db: Db,
    payments: PgPaymentsRepository,
    ledger: PgLedgerRepository,
    assembler: Assembler,
    policy: SettlementPolicy,
    webhook_secret: String,
    horizon: SignedDuration,
    notifications: NotificationQueue,
}

fn refund_notice(record: &PaymentRecord) -> Notification {
    Notification::new(
        record.user_uuid.into_uuid(),
        "Your card payment could not be turned into an order and was credited to your balance",
    )
    .about(RelatedObject::Payment(record.uuid.into_uuid()))
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(
        db: Db,
        settlement: &SettlementSettings,
        payments: &PaymentSettings,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            db,
            payments: PgPaymentsRepository::new(),
            ledger: PgLedgerRepository::new(),
            assembler: Assembler::new(settlement.policy(), settlement.currency.clone()),
            policy: settlement.policy(),
            webhook_secret: payments.webhook_secret.clone(),
            horizon: payments.horizon,
            notifications,
        }
    }

    async fn fail(
        &self,
        payment: PaymentUuid,
        provider_reference: Option<&str>,
    ) -> Result<bool, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.payments.lock_payment(&mut tx, payment).await?;
        let failed = self
            .payments
            .settle(&mut tx, payment, PaymentStatus::Failed, provider_reference)
            .await?;

        tx.commit().await?;

        if failed {
            self.notifications.enqueue(Notification::new(
                record.user_uuid.into_uuid(),
                "Your card payment did not go through",
            ));
        }

        Ok(failed)
    }

    /// Credit a failed or expired payment's amount back to the buyer, house account debited.
    ///
    /// Returns `false` when it was already refunded.
    async fn refund(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &PaymentRecord,
    ) -> Result<bool, PaymentsServiceError> {
        if !self.payments.mark_refunded(tx, record.uuid).await? {
            return Ok(false);
        }

        let postings = self.policy.payment_refund(
            record.user_uuid.into_uuid(),
            record.uuid.into_uuid(),
            record.amount,
        )?;

        self.ledger.post_all(tx, postings.iter()).await?;

        info!(
            payment_uuid = %record.uuid,
            amount = record.amount,
            "captured payment refunded to balance"
        );

        Ok(true)
    }

    /// Fail a captured payment whose order was refused and hand the money back.
    async fn reject(
        &self,
        payment: PaymentUuid,
        provider_reference: Option<&str>,
    ) -> Result<(), PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.payments.lock_payment(&mut tx, payment).await?;

        let refunded = self
            .payments
            .settle(&mut tx, payment, PaymentStatus::Failed, provider_reference)
            .await?
            && self.refund(&mut tx, &record).await?;

        tx.commit().await?;

        if refunded {
            self.notifications.enqueue(refund_notice(&record));
        }

        Ok(())
    }

    async fn capture(
        &self,
        payment: PaymentUuid,
        provider_reference: Option<&str>,
    ) -> Result<WebhookOutcome, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.payments.lock_payment(&mut tx, payment).await?;

        if !self
            .payments
            .settle(&mut tx, payment, PaymentStatus::Succeeded, provider_reference)
            .await?
        {
            let gave_up = matches!(record.status, PaymentStatus::Failed | PaymentStatus::Expired);

            if gave_up && self.refund(&mut tx, &record).await? {
                tx.commit().await?;

                warn!(payment_uuid = %payment, status = %record.status, "late capture refunded");

                self.notifications.enqueue(refund_notice(&record));

                return Ok(WebhookOutcome::Refunded);
            }

            tx.rollback().await?;

            info!(payment_uuid = %payment, status = %record.status, "duplicate webhook delivery");

            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let assembled = self
            .assembler
            .assemble(
                &mut tx,
                Assembly {
                    user: record.user_uuid,
                    address: record.address_uuid,
                    coupon_code: record.coupon_code.as_deref(),
                    payment_method: PaymentMethod::CreditCard,
                    lines: LineSource::Payment(payment),
                    prepaid: true,
                    now: Timestamp::now(),
                },
            )
            .await;

        let (order, notifications) = match assembled {
            Ok(assembled) => assembled,
            Err(error) => {
                tx.rollback().await?;

                // Rejections are final; storage failures stay pending for the next delivery.
                if error.kind() != ErrorKind::Internal {
                    warn!(payment_uuid = %payment, error = %error, "captured payment rejected");

                    self.reject(payment, provider_reference).await?;
                }

                return Err(error.into());
            }
        };

        if order.totals.final_amount != record.amount {
            tx.rollback().await?;

            warn!(
                payment_uuid = %payment,
                captured = record.amount,
                final_amount = order.totals.final_amount,
                "captured amount differs from the assembled order"
            );

            self.reject(payment, provider_reference).await?;

            return Err(PaymentsServiceError::AmountMismatch {
                captured: record.amount,
                assembled: order.totals.final_amount,
            });
        }

        self.payments
            .attach_order(&mut tx, payment, order.uuid)
            .await?;

        tx.commit().await?;

        Span::current().record("order_uuid", order.uuid.to_string());

        info!(payment_uuid = %payment, order_uuid = %order.uuid, "captured card payment");

        self.notifications.enqueue_all(notifications);

        Ok(WebhookOutcome::Completed(order))
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    #[tracing::instrument(
        name = "payments.service.handle_webhook",
        skip(self, payload, signature_header),
        fields(payment_uuid, order_uuid),
        err
    )]
    async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome, PaymentsServiceError> {
        if !signature::verify(self.webhook_secret.as_bytes(), payload, signature_header) {
            return Err(PaymentsServiceError::InvalidSignature);
        }

        let event: PaymentEvent =
            serde_json::from_slice(payload).map_err(PaymentsServiceError::InvalidPayload)?;

        let payment = PaymentUuid::from_uuid(event.client_reference);

        Span::current().record("payment_uuid", payment.to_string());

        match event.kind {
            PaymentEventType::Succeeded => {
                self.capture(payment, event.provider_reference.as_deref())
                    .await
            }
            PaymentEventType::Failed => {
                if self
                    .fail(payment, event.provider_reference.as_deref())
                    .await?
                {
                    info!(payment_uuid = %payment, "card payment failed");

                    Ok(WebhookOutcome::Failed)
                } else {
                    Ok(WebhookOutcome::AlreadyProcessed)
                }
            }
        }
    }

    async fn get_payment(
        &self,
        actor: &Actor,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let payment = self.payments.get_payment(&mut tx, payment).await?;

        tx.commit().await?;

        if !actor.is_or_admin(payment.user_uuid.into_uuid()) {
            return Err(PaymentsServiceError::Forbidden);
        }

        Ok(payment)
    }

    #[tracing::instrument(
        name = "payments.service.sweep",
        skip(self),
        fields(payments_expired),
        err
    )]
    async fn sweep(&self, now: Timestamp) -> Result<SweepReport, PaymentsServiceError> {
        let cutoff = now - self.horizon;
        let mut tx = self.db.begin().await?;

        let expired = self.payments.expire_stale(&mut tx, cutoff).await?;

        tx.commit().await?;

        let report = SweepReport {
            payments_expired: expired.len(),
        };

        Span::current().record("payments_expired", report.payments_expired);

        if report != SweepReport::default() {
            info!(
                payments_expired = report.payments_expired,
                "expired stale card payments"
            );
        }

        Ok(report)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Apply a signed gateway event. Repeated deliveries of the same event are harmless.
    async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome, PaymentsServiceError>;

    /// A payment, visible to its payer and admins.
    async fn get_payment(
        &self,
        actor: &Actor,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, PaymentsServiceError>;

    /// Expire pending payments older than the payment horizon.
    ///
    /// A pending card checkout holds no order or stock, so expiring its payment is what cancels it.
    async fn sweep(&self, now: Timestamp) -> Result<SweepReport, PaymentsServiceError>;
}
