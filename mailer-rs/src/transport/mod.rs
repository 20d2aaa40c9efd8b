//! Mail transport abstraction
//!
//! A transport takes a fully rendered message and hands it to a provider.
//! Rendering code never sees connection settings, only a built transport:
//! - [`smtp`]: SMTP relay via `lettre`
//! - [`log`]: Dry run that logs and records messages

use crate::config::TransportConfig;
use crate::error::{MailerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub mod log;
pub mod smtp;

pub use self::log::LogTransport;
pub use self::smtp::SmtpTransport;

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Sender address
    pub from_address: String,
    /// Sender display name
    pub from_name: Option<String>,
    /// Recipient address
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Plain text alternative
    pub text: Option<String>,
}

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: String,
}

/// Mail transport trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Provider tag, for logs and health output
    fn provider(&self) -> &'static str;

    /// Deliver one message
    async fn send(&self, message: OutgoingMessage) -> Result<SendReceipt>;

    /// Check that the provider is reachable and accepts our credentials
    async fn verify(&self) -> Result<()>;
}

/// Build the transport named by `config.provider`
pub fn build_transport(config: &TransportConfig) -> Result<Arc<dyn MailTransport>> {
    let transport: Arc<dyn MailTransport> = match config.provider.to_ascii_lowercase().as_str() {
        "smtp" => {
            let smtp = config.smtp.as_ref().ok_or_else(|| {
                MailerError::Config("provider smtp requires a [transport.smtp] section".to_string())
            })?;
            Arc::new(SmtpTransport::from_config(smtp)?)
        }
        "log" => Arc::new(LogTransport::new()),
        other => return Err(MailerError::UnsupportedProvider(other.to_string())),
    };

    info!(provider = transport.provider(), "Mail transport ready");
    Ok(transport)
}
