//! API request handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::dispatch::{dispatch_batch, BatchSummary};
use crate::sender::{CampaignSender, SendReport};
use crate::templates::{Campaign, EmailTemplate, Recipient, RenderedEmail, TemplateRenderer};
use crate::tracking::new_tracking_id;
use crate::utils::validate_email;

/// Shared application state
pub struct AppState {
    pub sender: CampaignSender,
    /// Public origin used in tracking URLs
    pub base_url: String,
    /// Maximum sends in flight for batch requests
    pub concurrency: usize,
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(msg: &str) -> Self {
        Self {
            error: msg.to_string(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn bad_request(msg: &str) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(msg)))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Transport health check result
#[derive(Debug, Serialize, Deserialize)]
pub struct TransportHealth {
    pub provider: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Preview request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub template: EmailTemplate,
    pub recipient: Recipient,
    #[serde(default)]
    pub tracking_id: Option<String>,
}

/// Rendered preview with placeholders nothing matched
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub tracking_id: String,
    pub email: RenderedEmail,
    pub unresolved: Vec<String>,
}

/// Single send request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub template: EmailTemplate,
    pub recipient: Recipient,
    pub campaign: Campaign,
    #[serde(default)]
    pub tracking_id: Option<String>,
}

/// Batch send request body
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub template: EmailTemplate,
    pub campaign: Campaign,
    pub recipients: Vec<Recipient>,
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/transport/verify - Check the configured transport
pub async fn verify_transport(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<TransportHealth>) {
    let transport = state.sender.transport();

    match transport.verify().await {
        Ok(()) => (
            StatusCode::OK,
            Json(TransportHealth {
                provider: transport.provider().to_string(),
                ok: true,
                error: None,
            }),
        ),
        Err(e) => {
            warn!(provider = transport.provider(), error = %e, "Transport verification failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(TransportHealth {
                    provider: transport.provider().to_string(),
                    ok: false,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

/// POST /api/preview - Render without sending
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> ApiResult<PreviewResponse> {
    let tracking_id = req.tracking_id.unwrap_or_else(new_tracking_id);
    let campaign = Campaign::new("preview");

    let email = TemplateRenderer::render_email(
        &req.template,
        &req.recipient,
        &campaign,
        &tracking_id,
        &state.base_url,
    );

    let unresolved =
        TemplateRenderer::unresolved_placeholders(&req.template, &req.recipient);

    Ok(Json(PreviewResponse {
        tracking_id,
        email,
        unresolved,
    }))
}

/// POST /api/send - Render and send to one recipient
pub async fn send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> ApiResult<SendReport> {
    validate_email(&req.recipient.email).map_err(|e| bad_request(&e.to_string()))?;

    let tracking_id = req.tracking_id.unwrap_or_else(new_tracking_id);
    let report = state
        .sender
        .send(
            &req.template,
            &req.recipient,
            &req.campaign,
            &tracking_id,
            &state.base_url,
        )
        .await;

    Ok(Json(report))
}

/// POST /api/send/batch - Send to many recipients
pub async fn send_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> ApiResult<BatchSummary> {
    if req.recipients.is_empty() {
        return Err(bad_request("recipients must not be empty"));
    }

    let invalid: Vec<&str> = req
        .recipients
        .iter()
        .filter(|r| validate_email(&r.email).is_err())
        .map(|r| r.email.as_str())
        .collect();
    if !invalid.is_empty() {
        return Err(bad_request(&format!(
            "invalid recipient addresses: {}",
            invalid.join(", ")
        )));
    }

    let summary = dispatch_batch(
        &state.sender,
        &req.template,
        &req.campaign,
        &req.recipients,
        &state.base_url,
        state.concurrency,
    )
    .await;

    Ok(Json(summary))
}
