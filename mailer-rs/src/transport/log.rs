//! Dry-run transport
//!
//! Logs every message instead of delivering it and keeps the most recent
//! ones in memory for inspection.

use crate::error::Result;
use crate::transport::{MailTransport, OutgoingMessage, SendReceipt};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Number of messages kept for inspection
const MAX_RETAINED: usize = 1000;

pub struct LogTransport {
    sent: Mutex<VecDeque<OutgoingMessage>>,
}

impl LogTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(VecDeque::new()),
        }
    }

    /// Messages "sent" so far, oldest first
    pub async fn sent_messages(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().await.iter().cloned().collect()
    }
}

impl Default for LogTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for LogTransport {
    fn provider(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<SendReceipt> {
        let message_id = format!("<{}@dry-run>", Uuid::new_v4());

        info!(
            from = %message.from_address,
            to = %message.to,
            subject = %message.subject,
            html_bytes = message.html.len(),
            has_text = message.text.is_some(),
            message_id = %message_id,
            "Dry run: message not delivered"
        );

        let mut sent = self.sent.lock().await;
        if sent.len() == MAX_RETAINED {
            sent.pop_front();
        }
        sent.push_back(message);

        Ok(SendReceipt { message_id })
    }

    async fn verify(&self) -> Result<()> {
        Ok(())
    }
}
