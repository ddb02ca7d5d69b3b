//! Background sweep of stale card payments.

use std::{sync::Arc, time::Duration};

use jiff::Timestamp;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{error, info};

use souq_app::domain::payments::{PaymentsService, data::SweepReport};

/// Run one sweep, logging the outcome. Failures are retried on the next tick.
pub(crate) async fn sweep_once(payments: &dyn PaymentsService, now: Timestamp) -> Option<SweepReport> {
    match payments.sweep(now).await {
        Ok(report) => {
            if report != SweepReport::default() {
                info!(
                    payments_expired = report.payments_expired,
                    "stale payment sweep finished"
                );
            }

            Some(report)
        }
        Err(error) => {
            error!(error = %error, "stale payment sweep failed");

            None
        }
    }
}

/// Sweep every `period` until the runtime shuts down.
pub(crate) fn spawn(payments: Arc<dyn PaymentsService>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);

        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            sweep_once(payments.as_ref(), Timestamp::now()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use souq_app::domain::payments::{MockPaymentsService, PaymentsServiceError};

    use super::*;

    #[tokio::test]
    async fn reports_what_was_swept() {
        let now = Timestamp::UNIX_EPOCH;

        let mut payments = MockPaymentsService::new();

        payments
            .expect_sweep()
            .once()
            .withf(move |at| *at == now)
            .return_once(|_| {
                Ok(SweepReport {
                    payments_expired: 2,
                })
            });

        let report = sweep_once(&payments, now).await;

        assert_eq!(
            report,
            Some(SweepReport {
                payments_expired: 2,
            })
        );
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_sweep()
            .once()
            .return_once(|_| Err(PaymentsServiceError::NotFound));

        assert_eq!(sweep_once(&payments, Timestamp::UNIX_EPOCH).await, None);
    }
}
