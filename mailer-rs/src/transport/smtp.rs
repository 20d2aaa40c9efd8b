//! SMTP transport for sending campaign mail
//!
//! Relays rendered messages to a configured SMTP server through `lettre`.
//!
//! # Security modes
//! - `tls`: implicit TLS from the first byte (port 465)
//! - `starttls`: plain connect, then mandatory STARTTLS upgrade (port 587)
//! - `none`: no encryption, for local relays and test sinks

use crate::config::{SmtpConfig, SmtpSecurity};
use crate::error::{MailerError, Result};
use crate::transport::{MailTransport, OutgoingMessage, SendReceipt};
use crate::utils::email_domain;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// SMTP relay transport
///
/// # Examples
/// ```no_run
/// use mailer_rs::config::{SmtpConfig, SmtpSecurity};
/// use mailer_rs::transport::{MailTransport, SmtpTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = SmtpTransport::from_config(&SmtpConfig {
///     host: "smtp.example.com".to_string(),
///     port: 587,
///     username: Some("mailer".to_string()),
///     password: Some("secret".to_string()),
///     security: SmtpSecurity::Starttls,
///     timeout_seconds: 30,
/// })?;
/// transport.verify().await?;
/// # Ok(())
/// # }
/// ```
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    server_addr: String,
}

impl SmtpTransport {
    /// Create a transport from validated SMTP settings. Does not connect.
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let mut builder = match config.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            SmtpSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            server_addr: format!("{}:{}", config.host, config.port),
        })
    }

    /// Build the MIME message and the Message-ID assigned to it
    ///
    /// HTML-only messages are sent as a single part; with a text body the
    /// message becomes `multipart/alternative`.
    pub fn build_message(message: &OutgoingMessage) -> Result<(Message, String)> {
        let from = Mailbox::new(
            message.from_name.clone(),
            parse_address(&message.from_address)?,
        );
        let to = Mailbox::new(None, parse_address(&message.to)?);

        let domain = email_domain(&message.from_address).unwrap_or("localhost");
        let message_id = format!("<{}@{}>", Uuid::new_v4(), domain);

        let builder = Message::builder()
            .message_id(Some(message_id.clone()))
            .from(from)
            .to(to)
            .subject(message.subject.clone());

        let built = match &message.text {
            Some(text) => builder.multipart(MultiPart::alternative_plain_html(
                text.clone(),
                message.html.clone(),
            )),
            None => builder.singlepart(SinglePart::html(message.html.clone())),
        }
        .map_err(|e| MailerError::MessageBuild(e.to_string()))?;

        Ok((built, message_id))
    }
}

fn parse_address(address: &str) -> Result<Address> {
    address
        .parse::<Address>()
        .map_err(|e| MailerError::InvalidEmail(format!("{}: {}", address, e)))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn provider(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<SendReceipt> {
        let (email, message_id) = Self::build_message(&message)?;

        debug!(to = %message.to, server = %self.server_addr, "Relaying message");

        let response = self.transport.send(email).await.map_err(|e| {
            error!(to = %message.to, server = %self.server_addr, error = %e, "SMTP send failed");
            MailerError::Transport(e.to_string())
        })?;

        info!(
            to = %message.to,
            message_id = %message_id,
            code = %response.code(),
            "Mail accepted by relay"
        );

        Ok(SendReceipt { message_id })
    }

    async fn verify(&self) -> Result<()> {
        match self.transport.test_connection().await {
            Ok(true) => {
                info!(server = %self.server_addr, "SMTP connection verified");
                Ok(())
            }
            Ok(false) => Err(MailerError::Transport(format!(
                "SMTP server {} did not accept the connection",
                self.server_addr
            ))),
            Err(e) => Err(MailerError::Transport(format!(
                "SMTP server {} unreachable: {}",
                self.server_addr, e
            ))),
        }
    }
}
