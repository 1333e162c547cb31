//! Email provider webhook endpoint.
//!
//! Once a delivery is authentic and well formed this always answers 200, with
//! the processing result in the body. A non-2xx would make the provider
//! redeliver, which is only useful for deliveries we could not read at all.

use axum::{Extension, Json, body::Bytes, response::IntoResponse};
use hyper::{HeaderMap, StatusCode};
use serde_json::json;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::error::{SignatureError, WebhookError};
use crate::processor::ProcessResult;
use crate::signature::{HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use crate::webhook::WebhookPayload;

/// Tag for OpenAPI documentation.
pub const WEBHOOKS_TAG: &str = "Webhooks";

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(receive_email_webhook))
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(SignatureError::MissingHeader(name))
}

/// Authenticates and decodes a delivery. Returns the provider event id with the payload.
pub fn authenticate(
    resources: &AppResources,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(String, WebhookPayload), WebhookError> {
    let event_id = header(headers, HEADER_ID)?;
    if let Some(verifier) = resources.verifier.as_deref() {
        verifier.verify(
            event_id,
            header(headers, HEADER_TIMESTAMP)?,
            header(headers, HEADER_SIGNATURE)?,
            body,
        )?;
    }
    let payload = WebhookPayload::from_slice(body)?;
    Ok((event_id.to_string(), payload))
}

#[tracing::instrument(skip(resources, headers, body), fields(body_len = body.len()))]
#[utoipa::path(
    post,
    path = "/api/webhooks/email",
    tag = WEBHOOKS_TAG,
    operation_id = "Receive Email Webhook",
    summary = "Ingest a delivery event from the email provider",
    description = "Applies a delivered/opened/clicked/bounced/complained event to the send ledger.\n\n\
                   **Headers:** `svix-id` (idempotency key), `svix-timestamp` and `svix-signature` \
                   (required when a signing secret is configured).\n\n\
                   Redelivered events with an already processed `svix-id` are acknowledged without side effects.",
    request_body(content = WebhookPayload, description = "Provider webhook envelope"),
    responses(
        (status = 200, description = "Event handled; see `success`/`error` for the outcome", body = ProcessResult, content_type = "application/json"),
        (status = 400, description = "Malformed body or missing `svix-id`", content_type = "application/json"),
        (status = 401, description = "Signature verification failed", content_type = "application/json")
    )
)]
async fn receive_email_webhook(
    Extension(resources): Extension<AppResources>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let (event_id, payload) = match authenticate(&resources, &headers, &body) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(
                name = "api.receive_email_webhook.rejected",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                message = "Rejected email webhook"
            );
            return (e.status_code(), Json(json!({ "error": e.to_string() })));
        }
    };

    let result = resources
        .processor
        .process_email_event(&event_id, &payload.event_type, &payload)
        .await;
    (StatusCode::OK, Json(json!(result)))
}
