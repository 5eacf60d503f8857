use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use std::time::Duration;

use rep_core::{EmailSettings, Error, Notifier, Result};

pub mod prelude {
    pub use super::SmtpNotifier;
    pub use rep_core::Notifier;
}

/// Sends alerts as plain-text mail over SMTP with STARTTLS.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    server: String,
    port: u16,
}

impl fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .field("server", &self.server)
            .field("port", &self.port)
            .field("credentials", &"<redacted>")
            .finish()
    }
}

impl SmtpNotifier {
    /// Fails with `Error::Config` when a credential is missing or malformed.
    pub fn from_settings(email: &EmailSettings, timeout: Duration) -> Result<Self> {
        let missing = email.missing_credentials();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing email credentials: {}",
                missing.join(", ")
            )));
        }
        let sender = email.sender.as_deref().unwrap_or_default();
        let password = email.password.as_deref().unwrap_or_default();
        let recipient = email.recipient.as_deref().unwrap_or_default();

        let from: Mailbox = sender
            .parse()
            .map_err(|e| Error::Config(format!("invalid sender address {}: {}", sender, e)))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| Error::Config(format!("invalid recipient address {}: {}", recipient, e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&email.smtp_server)
            .map_err(|e| Error::Config(format!("invalid SMTP server {}: {}", email.smtp_server, e)))?
            .port(email.smtp_port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            server: email.smtp_server.clone(),
            port: email.smtp_port,
        })
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::Notification(format!("unable to build message: {}", e)))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<bool> {
        let message = self.build_message(subject, body)?;
        tracing::debug!("Sending '{}' to {} via {}:{}", subject, self.to, self.server, self.port);
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| Error::Notification(format!("SMTP delivery failed: {}", e)))?;
        Ok(response.is_positive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> EmailSettings {
        EmailSettings {
            sender: Some("alerts@example.com".to_string()),
            password: Some("app-password".to_string()),
            recipient: Some("Ops Team <ops@example.com>".to_string()),
            ..EmailSettings::default()
        }
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let err = SmtpNotifier::from_settings(&EmailSettings::default(), Duration::from_secs(5))
            .unwrap_err();
        match err {
            Error::Config(message) => {
                assert!(message.contains("EMAIL_SENDER"));
                assert!(message.contains("EMAIL_RECIPIENT"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_address_is_config_error() {
        let settings = EmailSettings {
            recipient: Some("not an address".to_string()),
            ..email()
        };
        assert!(matches!(
            SmtpNotifier::from_settings(&settings, Duration::from_secs(5)),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_message_and_debug() {
        let notifier = SmtpNotifier::from_settings(&email(), Duration::from_secs(5)).unwrap();
        assert_eq!(notifier.name(), "smtp");
        assert!(!format!("{:?}", notifier).contains("app-password"));

        let message = notifier
            .build_message("Reputation Alert: Enel", "score -0.47")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Reputation Alert: Enel"));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("score -0.47"));
    }
}
