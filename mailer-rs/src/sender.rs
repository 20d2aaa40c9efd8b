//! Campaign send orchestration
//!
//! Renders a template for one recipient and hands the result to the
//! configured transport. Rendering cannot fail; a transport failure is
//! reported in the returned [`SendReport`] rather than as an error, and is
//! never retried here.

use crate::config::SenderConfig;
use crate::templates::{Campaign, EmailTemplate, Recipient, TemplateRenderer};
use crate::transport::{MailTransport, OutgoingMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Identity placed in the From header of every send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub address: String,
    pub name: Option<String>,
}

impl From<&SenderConfig> for SenderIdentity {
    fn from(config: &SenderConfig) -> Self {
        Self {
            address: config.address.clone(),
            name: config.name.clone(),
        }
    }
}

/// Result of one send attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SendOutcome {
    Sent {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    Failed {
        reason: String,
    },
}

/// Per-recipient send report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReport {
    pub recipient: String,
    pub tracking_id: String,
    pub campaign_id: String,
    pub sent_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: SendOutcome,
}

impl SendReport {
    pub fn is_sent(&self) -> bool {
        matches!(self.outcome, SendOutcome::Sent { .. })
    }
}

/// Sends rendered campaign mail through a transport
#[derive(Clone)]
pub struct CampaignSender {
    transport: Arc<dyn MailTransport>,
    identity: SenderIdentity,
}

impl CampaignSender {
    pub fn new(transport: Arc<dyn MailTransport>, identity: SenderIdentity) -> Self {
        Self {
            transport,
            identity,
        }
    }

    pub fn transport(&self) -> &Arc<dyn MailTransport> {
        &self.transport
    }

    /// Render subject and bodies for `recipient` into a transport message
    pub fn compose(
        &self,
        template: &EmailTemplate,
        recipient: &Recipient,
        campaign: &Campaign,
        tracking_id: &str,
        base_url: &str,
    ) -> OutgoingMessage {
        let rendered =
            TemplateRenderer::render_email(template, recipient, campaign, tracking_id, base_url);

        OutgoingMessage {
            from_address: self.identity.address.clone(),
            from_name: self.identity.name.clone(),
            to: recipient.email.clone(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
        }
    }

    /// Render and send to one recipient
    pub async fn send(
        &self,
        template: &EmailTemplate,
        recipient: &Recipient,
        campaign: &Campaign,
        tracking_id: &str,
        base_url: &str,
    ) -> SendReport {
        let message = self.compose(template, recipient, campaign, tracking_id, base_url);

        let outcome = match self.transport.send(message).await {
            Ok(receipt) => {
                info!(
                    campaign_id = %campaign.id,
                    tracking_id = %tracking_id,
                    to = %recipient.email,
                    message_id = %receipt.message_id,
                    "Campaign mail sent"
                );
                SendOutcome::Sent {
                    message_id: receipt.message_id,
                }
            }
            Err(e) => {
                warn!(
                    campaign_id = %campaign.id,
                    tracking_id = %tracking_id,
                    to = %recipient.email,
                    provider = self.transport.provider(),
                    error = %e,
                    "Campaign mail failed"
                );
                SendOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        SendReport {
            recipient: recipient.email.clone(),
            tracking_id: tracking_id.to_string(),
            campaign_id: campaign.id.clone(),
            sent_at: Utc::now(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailerError;
    use crate::transport::{MockMailTransport, SendReceipt};

    fn identity() -> SenderIdentity {
        SenderIdentity {
            address: "it-security@corp.example".to_string(),
            name: Some("IT Security".to_string()),
        }
    }

    fn template() -> EmailTemplate {
        EmailTemplate {
            subject: "Hi {{firstName}}".to_string(),
            body_html: "<body>{{link}}</body>".to_string(),
            body_text: Some("{{link}}".to_string()),
        }
    }

    #[tokio::test]
    async fn test_send_passes_rendered_message() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .withf(|message| {
                message.to == "ann@corp.example"
                    && message.subject == "Hi Ann"
                    && message.from_name.as_deref() == Some("IT Security")
                    && message.html.contains("/api/track/open/t1")
                    && message.text.as_deref() == Some("https://x.test/api/track/click/t1")
            })
            .times(1)
            .returning(|_| {
                Ok(SendReceipt {
                    message_id: "<id-1@corp.example>".to_string(),
                })
            });

        let sender = CampaignSender::new(Arc::new(transport), identity());
        let recipient = Recipient::new("ann@corp.example").with_first_name("Ann");
        let report = sender
            .send(&template(), &recipient, &Campaign::new("c-1"), "t1", "https://x.test")
            .await;

        assert!(report.is_sent());
        assert_eq!(report.tracking_id, "t1");
        assert_eq!(report.campaign_id, "c-1");
        assert_eq!(
            report.outcome,
            SendOutcome::Sent {
                message_id: "<id-1@corp.example>".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_once() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(MailerError::Transport("connection refused".to_string())));
        transport.expect_provider().return_const("mock");

        let sender = CampaignSender::new(Arc::new(transport), identity());
        let report = sender
            .send(
                &template(),
                &Recipient::new("ann@corp.example"),
                &Campaign::new("c-1"),
                "t1",
                "https://x.test",
            )
            .await;

        assert!(!report.is_sent());
        match report.outcome {
            SendOutcome::Failed { reason } => assert!(reason.contains("connection refused")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_report_json_shape() {
        let report = SendReport {
            recipient: "ann@corp.example".to_string(),
            tracking_id: "t1".to_string(),
            campaign_id: "c-1".to_string(),
            sent_at: Utc::now(),
            outcome: SendOutcome::Failed {
                reason: "boom".to_string(),
            },
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "boom");
        assert_eq!(value["trackingId"], "t1");
        assert_eq!(value["campaignId"], "c-1");
    }
}
