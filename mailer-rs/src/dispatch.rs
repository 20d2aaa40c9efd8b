//! Batch dispatch with bounded concurrency
//!
//! Sends one template to many recipients. Each recipient gets its own
//! tracking id and is an independent unit of failure; reports arrive in
//! completion order.
//!
//! ```text
//! recipients ─▶ [tracking id] ─▶ buffer_unordered(n) ─▶ CampaignSender ─▶ reports
//! ```

use crate::sender::{CampaignSender, SendReport};
use crate::templates::{Campaign, EmailTemplate, Recipient};
use crate::tracking::new_tracking_id;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of a batch send
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub reports: Vec<SendReport>,
}

impl BatchSummary {
    fn from_reports(reports: Vec<SendReport>) -> Self {
        let sent = reports.iter().filter(|r| r.is_sent()).count();
        Self {
            total: reports.len(),
            sent,
            failed: reports.len() - sent,
            reports,
        }
    }
}

/// Send `template` to every recipient, at most `concurrency` at a time
pub async fn dispatch_batch(
    sender: &CampaignSender,
    template: &EmailTemplate,
    campaign: &Campaign,
    recipients: &[Recipient],
    base_url: &str,
    concurrency: usize,
) -> BatchSummary {
    let concurrency = concurrency.max(1);

    info!(
        campaign_id = %campaign.id,
        recipients = recipients.len(),
        concurrency,
        "Dispatching campaign batch"
    );

    // Build the futures before streaming: a closure over `&Recipient` breaks the
    // Send bound axum puts on handler futures.
    let sends: Vec<_> = recipients
        .iter()
        .map(|recipient| {
            let tracking_id = new_tracking_id();
            async move {
                sender
                    .send(template, recipient, campaign, &tracking_id, base_url)
                    .await
            }
        })
        .collect();

    let reports: Vec<SendReport> = stream::iter(sends)
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let summary = BatchSummary::from_reports(reports);

    info!(
        campaign_id = %campaign.id,
        sent = summary.sent,
        failed = summary.failed,
        "Campaign batch finished"
    );

    summary
}
