//! Best-effort email notifications.
//!
//! Services push [`Notification`]s onto a [`MailQueue`]; a background task
//! started with [`run_mail_worker`] hands them to a [`Notifier`]. Enqueueing
//! never blocks and delivery failures are only logged.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

pub mod smtp;
pub mod templates;

pub use smtp::SmtpNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    /// HTML body.
    pub body: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid email address '{address}': {source}")]
    Address {
        address: String,
        source: lettre::address::AddressError,
    },

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Delivery failed for {failed} of {total} recipient(s)")]
    Partial { failed: usize, total: usize },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            subject = %notification.subject,
            recipients = ?notification.recipients,
            "Notification (not delivered, no SMTP configured)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[derive(Debug, Clone)]
pub struct MailQueue {
    sender: UnboundedSender<Notification>,
}

impl MailQueue {
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, notification: Notification) {
        if notification.recipients.is_empty() {
            debug!(subject = %notification.subject, "Skipping notification without recipients");
            return;
        }
        if let Err(err) = self.sender.send(notification) {
            warn!(subject = %err.0.subject, "Mail queue closed, dropping notification");
        }
    }
}

/// Drains `receiver` until every [`MailQueue`] handle is dropped.
pub async fn run_mail_worker(
    mut receiver: UnboundedReceiver<Notification>,
    notifier: Arc<dyn Notifier>,
) {
    info!(notifier = notifier.name(), "Mail worker started");

    while let Some(notification) = receiver.recv().await {
        match notifier.send(&notification).await {
            Ok(()) => debug!(subject = %notification.subject, "Notification delivered"),
            Err(e) => warn!(
                error = %e,
                subject = %notification.subject,
                recipients = ?notification.recipients,
                "Failed to deliver notification"
            ),
        }
    }

    info!("Mail worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FlakyNotifier {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            if notification.subject.contains("fail") {
                let address = "not an address".to_string();
                let source = address.parse::<lettre::Address>().unwrap_err();
                return Err(NotifyError::Address { address, source });
            }
            self.delivered.lock().await.push(notification.subject.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn notification(subject: &str, recipients: &[&str]) -> Notification {
        Notification {
            subject: subject.to_string(),
            body: "<p>hi</p>".to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_worker_continues_after_failure() {
        let (queue, receiver) = MailQueue::channel();
        let notifier = Arc::new(FlakyNotifier::default());

        queue.enqueue(notification("first", &["a@example.com"]));
        queue.enqueue(notification("please fail", &["b@example.com"]));
        queue.enqueue(notification("third", &["c@example.com"]));
        drop(queue);

        run_mail_worker(receiver, notifier.clone()).await;

        assert_eq!(*notifier.delivered.lock().await, vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_enqueue_skips_empty_recipients() {
        let (queue, mut receiver) = MailQueue::channel();
        queue.enqueue(notification("nobody", &[]));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_gone_does_not_panic() {
        let (queue, receiver) = MailQueue::channel();
        drop(receiver);
        queue.enqueue(notification("late", &["a@example.com"]));
    }
}
