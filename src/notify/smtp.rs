use std::future::Future;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::{MailSender, SmtpSettings};
use crate::notify::{Notification, Notifier, NotifyError};

/// Delivers notifications through an SMTP relay, one message per recipient.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings, sender: &MailSender) -> Result<Self, NotifyError> {
        let mut builder = if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        } else {
            // Plain connection, e.g. Mailpit in development.
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };
        builder = builder.port(settings.port);
        if let Some(username) = &settings.username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                settings.password.clone().unwrap_or_default(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(sender.name.clone()), parse_address(&sender.address)?),
        })
    }

    fn build_message(
        &self,
        recipient: &str,
        notification: &Notification,
    ) -> Result<Message, NotifyError> {
        let to = Mailbox::new(None, parse_address(recipient)?);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(notification.body.clone())?;
        Ok(message)
    }
}

fn parse_address(raw: &str) -> Result<Address, NotifyError> {
    raw.parse::<Address>().map_err(|source| NotifyError::Address {
        address: raw.to_string(),
        source,
    })
}

/// Attempts every recipient; one failure never skips the rest.
async fn send_each<F, Fut>(recipients: &[String], mut send_one: F) -> Result<(), NotifyError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), NotifyError>>,
{
    let mut failed = 0;
    for recipient in recipients {
        if let Err(e) = send_one(recipient.clone()).await {
            warn!(to = %recipient, error = %e, "Email delivery failed");
            failed += 1;
        }
    }

    if failed == 0 {
        Ok(())
    } else {
        Err(NotifyError::Partial {
            failed,
            total: recipients.len(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        send_each(&notification.recipients, move |recipient| async move {
            let message = self.build_message(&recipient, notification)?;
            self.transport.send(message).await?;
            info!(to = %recipient, subject = %notification.subject, "Email sent");
            Ok(())
        })
        .await
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> (SmtpSettings, MailSender) {
        (
            SmtpSettings {
                host: "localhost".into(),
                port: 1025,
                username: None,
                password: None,
                use_tls: false,
            },
            MailSender {
                address: "noreply@example.com".into(),
                name: "Event Management".into(),
            },
        )
    }

    #[tokio::test]
    async fn test_build_message_sets_html_and_recipient() {
        let (smtp, sender) = settings();
        let notifier = SmtpNotifier::new(&smtp, &sender).unwrap();
        let notification = Notification {
            subject: "You are registered at Meetup".into(),
            body: "<p>See you there</p>".into(),
            recipients: vec!["bob@example.com".into()],
        };

        let message = notifier.build_message("bob@example.com", &notification).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: bob@example.com"));
        assert!(raw.contains("Subject: You are registered at Meetup"));
        assert!(raw.contains("Content-Type: text/html"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_an_error() {
        let (smtp, sender) = settings();
        let notifier = SmtpNotifier::new(&smtp, &sender).unwrap();
        let notification = Notification {
            subject: "x".into(),
            body: "y".into(),
            recipients: vec![],
        };
        assert!(matches!(
            notifier.build_message("not an address", &notification),
            Err(NotifyError::Address { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_stop_the_rest() {
        let recipients: Vec<String> = ["alice@example.com", "not an address", "bob@example.com"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut attempted = Vec::new();

        let result = send_each(&recipients, |recipient| {
            attempted.push(recipient.clone());
            async move { parse_address(&recipient).map(|_| ()) }
        })
        .await;

        assert_eq!(attempted, recipients);
        assert!(matches!(result, Err(NotifyError::Partial { failed: 1, total: 3 })));
    }

    #[tokio::test]
    async fn test_all_recipients_delivered() {
        let recipients = vec!["alice@example.com".to_string()];
        let result = send_each(&recipients, |_| async { Ok(()) }).await;
        assert!(result.is_ok());
    }
}
