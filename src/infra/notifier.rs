//! Outbound notification delivery.
//!
//! `SmtpNotifier` sends through lettre when SMTP is configured and logs the
//! message instead when it is not. Errors never cross the notifier boundary
//! into a flow outcome; the engine logs and swallows them.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SmtpSettings;

/// Notification transport error. Logged at the boundary, never surfaced to
/// the end user.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid mail address: {0}")]
    Address(String),

    #[error("message build failed: {0}")]
    Message(String),

    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Outbound notifications fired by the account flows.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Welcome mail after a successful registration.
    async fn send_registration_email(&self, email: &str) -> Result<(), NotifyError>;

    /// Mail carrying the freshly generated password after a restore.
    async fn send_password_reset_email(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<(), NotifyError>;
}

/// Email payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Email subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
}

/// SMTP implementation of `Notifier`.
pub struct SmtpNotifier {
    settings: SmtpSettings,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn welcome_message(email: &str) -> EmailMessage {
        EmailMessage {
            to: email.to_string(),
            subject: "Welcome to our App!".to_string(),
            body: "Welcome to our App!\n\n\
                   Your new account has been created successfully. You can now \
                   log on with the credentials you registered.\n\n\
                   This is an automated response acknowledging your request. \
                   Please do not reply to this e-mail."
                .to_string(),
        }
    }

    fn reset_message(email: &str, password: &str, username: &str) -> EmailMessage {
        EmailMessage {
            to: email.to_string(),
            subject: "Password reset request".to_string(),
            body: format!(
                "Hello {username},\n\n\
                 A password reset request was made for your user. Here is your \
                 new password: {password}\n\n\
                 You will be prompted to choose a new password on your next \
                 logon.\n\n\
                 This is an automated response acknowledging your request. \
                 Please do not reply to this e-mail."
            ),
        }
    }

    async fn deliver(&self, message: EmailMessage) -> Result<(), NotifyError> {
        let Some(host) = self.settings.host.as_deref() else {
            // development mode: log the email instead of sending
            tracing::warn!("SMTP not configured - logging email instead of sending");
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                body = %message.body,
                "email (not sent)"
            );
            return Ok(());
        };

        let from: Mailbox = self
            .settings
            .from
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {}", self.settings.from, e)))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {}", message.to, e)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(self.settings.port);
        if let (Some(user), Some(pass)) = (&self.settings.username, &self.settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        builder
            .build()
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(to = %message.to, "email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_registration_email(&self, email: &str) -> Result<(), NotifyError> {
        self.deliver(Self::welcome_message(email)).await
    }

    async fn send_password_reset_email(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<(), NotifyError> {
        self.deliver(Self::reset_message(email, password, username)).await
    }
}
