use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AppError;

/// Outbound email delivery.
///
/// The password reset flow only needs plain-text sends, so the surface
/// stays small. Implementations must be shareable across workers.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Sends mail through an SMTP relay using STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds a mailer from the SMTP settings in `Config`.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::InternalServerError(format!("Invalid sender address: {}", e)))?;

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to build SMTP transport: {}", e))
            })?
            .credentials(credentials)
            .build();

        Ok(SmtpMailer { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to build email: {}", e))
            })?;

        self.transport.send(message).await.map_err(|e| {
            AppError::InternalServerError(format!("Failed to send email: {}", e))
        })?;

        Ok(())
    }
}

/// A delivered message captured by `MemoryMailer`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// In-memory mailer that records messages instead of delivering them.
/// Used by tests to inspect what would have been sent.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: RwLock<Vec<SentEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every message sent so far.
    pub async fn sent(&self) -> Vec<SentEmail> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        self.outbox.write().await.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
