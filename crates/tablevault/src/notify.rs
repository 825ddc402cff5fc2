//! Run outcome notification
//!
//! Formats the run log for mail rendering and delivers it exactly once per
//! run over SMTP. Delivery failure is logged at the call site and never
//! changes the run's reported outcome.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpSettings;
use crate::error::{BackupError, Result};

/// Subject for a run with no terminal error
pub const SUCCESS_SUBJECT: &str = "Database backup OK";

/// Subject embedding the run's terminal error
pub fn failure_subject(error: &BackupError) -> String {
    format!("Database backup FAILED: {error}")
}

/// Convert the rendered run log for mail rendering (bare `\n` to CRLF).
pub fn render_body(log: &str) -> String {
    log.replace('\n', "\r\n")
}

/// Delivery interface consumed by the orchestrator
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Attempt one delivery of the run summary.
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}

/// SMTP notifier over a STARTTLS relay
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpSettings) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| BackupError::config(format!("invalid SMTP relay {}: {e}", smtp.host)))?
            .port(smtp.port)
            .credentials(Credentials::new(smtp.user.clone(), smtp.pass.clone()))
            .build();

        let from = smtp
            .from
            .parse()
            .map_err(|e| BackupError::config(format!("invalid sender {}: {e}", smtp.from)))?;
        let to = smtp
            .to
            .parse()
            .map_err(|e| BackupError::config(format!("invalid recipient {}: {e}", smtp.to)))?;

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())
            .map_err(|e| BackupError::notification(format!("cannot build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| BackupError::notification(format!("delivery failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_subject_embeds_error() {
        let err = BackupError::dump("app", "orders", "exit status 2");
        let subject = failure_subject(&err);
        assert!(subject.starts_with("Database backup FAILED"));
        assert!(subject.contains("app.orders"));
    }

    #[test]
    fn test_render_body_converts_newlines() {
        assert_eq!(render_body("a\nb\nc"), "a\r\nb\r\nc");
        assert_eq!(render_body(""), "");
    }

    #[test]
    fn test_smtp_notifier_rejects_bad_addresses() {
        let smtp = SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            user: "u".into(),
            pass: "p".into(),
            from: "not an address".into(),
            to: "ops@example.com".into(),
        };
        assert!(matches!(
            SmtpNotifier::new(&smtp),
            Err(BackupError::Config(_))
        ));
    }

    #[test]
    fn test_smtp_notifier_accepts_valid_settings() {
        let smtp = SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            user: "u".into(),
            pass: "p".into(),
            from: "Backup <backup@example.com>".into(),
            to: "ops@example.com".into(),
        };
        assert!(SmtpNotifier::new(&smtp).is_ok());
    }
}
