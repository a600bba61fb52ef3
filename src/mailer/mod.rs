//! Outbound mail for password reset links.
//!
//! Two implementations sit behind [`ResetMailer`]: an SMTP transport for
//! deployments with a configured relay, and a logging fallback for
//! development where the link is written to the log instead of sent.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use crate::config::MailConfig;
use crate::errors::{Error, Result};

/// Build the link a reset mail points at.
pub fn reset_link(frontend_url: &str, token: &str) -> String {
    format!("{}/reset-password?token={}", frontend_url.trim_end_matches('/'), token)
}

/// Delivers password reset links to account holders.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn deliver_reset(&self, recipient: &str, reset_link: &str) -> Result<()>;
}

/// Development mailer: logs the reset link instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl ResetMailer for LogMailer {
    async fn deliver_reset(&self, recipient: &str, reset_link: &str) -> Result<()> {
        info!(recipient = %recipient, reset_link = %reset_link, "password reset link (smtp disabled)");
        Ok(())
    }
}

/// SMTP mailer backed by a pooled STARTTLS transport.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let transport = SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| Error::config(format!("Invalid SMTP relay {}: {}", config.smtp_host, e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| Error::config(format!("Invalid MAIL_FROM address: {}", e)))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl ResetMailer for SmtpMailer {
    #[instrument(skip(self, reset_link), fields(recipient = %recipient))]
    async fn deliver_reset(&self, recipient: &str, reset_link: &str) -> Result<()> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| Error::validation(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Password reset request")
            .body(format!(
                "A password reset was requested for your account.\n\n\
                 Open the link below within the next hour to choose a new password:\n\n\
                 {}\n\n\
                 If you did not request this, you can ignore this message.\n",
                reset_link
            ))
            .map_err(|e| Error::internal(format!("Failed to build reset mail: {}", e)))?;

        // SmtpTransport is blocking; keep it off the async runtime.
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| Error::internal(format!("Mail delivery task failed: {}", e)))?
            .map_err(|e| Error::internal(format!("Failed to send reset mail: {}", e)))?;

        info!("password reset mail sent");
        Ok(())
    }
}

/// Pick the mailer implementation for the given configuration.
pub fn build_mailer(config: &MailConfig) -> Result<std::sync::Arc<dyn ResetMailer>> {
    if config.smtp_enabled {
        Ok(std::sync::Arc::new(SmtpMailer::new(config)?))
    } else {
        Ok(std::sync::Arc::new(LogMailer))
    }
}
