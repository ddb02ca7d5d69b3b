//! Outgoing user notifications.
//!
//! Services enqueue notifications after their transaction commits. A background worker hands them
//! to a [`Notifier`]; a failed send is logged and dropped, never rolled back into the business
//! operation that produced it.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use souq::ledger::RelatedObject;

/// Queue capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 1_024;

/// A message for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub user: Uuid,
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedObject>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Notification {
    #[must_use]
    pub fn new(user: Uuid, text: impl Into<String>) -> Self {
        Self {
            user,
            text: text.into(),
            related: None,
            image: None,
        }
    }

    #[must_use]
    pub fn about(mut self, related: RelatedObject) -> Self {
        self.related = Some(related);
        self
    }
}

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("notification endpoint rejected the message: {0}")]
    Rejected(String),
}

/// Delivers a notification to its recipient.
#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            user = %notification.user,
            text = %notification.text,
            "notification"
        );

        Ok(())
    }
}

/// Posts notifications as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    url: String,
    http: Client,
}

impl HttpNotifier {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self.http.post(&self.url).json(notification).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(NotifyError::Rejected(format!("{status}: {text}")));
        }

        Ok(())
    }
}

/// Handle used by services to enqueue notifications.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    /// Start a worker draining the queue into `notifier`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(notifier: Arc<dyn Notifier>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Notification>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                if let Err(error) = notifier.send(&notification).await {
                    warn!(user = %notification.user, error = %error, "notification failed");
                }
            }

            debug!("notification queue closed");
        });

        Self { sender }
    }

    /// Queue a notification without waiting. Dropped with a warning when the queue is full.
    pub fn enqueue(&self, notification: Notification) {
        if let Err(error) = self.sender.try_send(notification) {
            warn!(error = %error, "notification dropped");
        }
    }

    pub fn enqueue_all(&self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            self.enqueue(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    struct Capture(mpsc::UnboundedSender<Notification>);

    #[async_trait]
    impl Notifier for Capture {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            let _ = self.0.send(notification.clone());

            Ok(())
        }
    }

    #[tokio::test]
    async fn queued_notifications_reach_the_notifier() -> TestResult {
        let (tx, mut rx) = unbounded_channel();
        let queue = NotificationQueue::spawn(Arc::new(Capture(tx)), 8);
        let user = Uuid::now_v7();

        queue.enqueue(Notification::new(user, "Your order is on its way"));

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await?;

        assert_eq!(
            received.map(|n| n.user),
            Some(user),
            "notification should be delivered"
        );

        Ok(())
    }

    #[tokio::test]
    async fn failing_notifier_does_not_stop_the_worker() -> TestResult {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(2)
            .returning(|_| Err(NotifyError::Rejected("503".to_string())));

        let queue = NotificationQueue::spawn(Arc::new(notifier), 8);

        queue.enqueue(Notification::new(Uuid::now_v7(), "first"));
        queue.enqueue(Notification::new(Uuid::now_v7(), "second"));

        tokio::time::sleep(Duration::from_millis(50)).await;

        Ok(())
    }
}
