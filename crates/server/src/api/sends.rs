//! Registration of outbound sends by the newsletter dispatch flow.

use axum::{Extension, Json, response::IntoResponse};
use hyper::StatusCode;
use serde_json::json;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::processor::NewEmailSend;

/// Tag for OpenAPI documentation.
pub const SENDS_TAG: &str = "Email Sends";

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(create_email_send))
}

#[tracing::instrument(skip(resources, payload), fields(resend_email_id = %payload.resend_email_id))]
#[utoipa::path(
    post,
    path = "/api/email-sends",
    tag = SENDS_TAG,
    operation_id = "Create Email Send",
    summary = "Register a dispatched email",
    description = "Records a send before any webhook for it can arrive. When `post_id` is set the \
                   post's `emails_sent` counter grows by `recipient_count`.",
    request_body(content = NewEmailSend, description = "Dispatch details"),
    responses(
        (status = 201, description = "Send registered", content_type = "application/json", example = json!({"id": "3f2b..."})),
        (status = 409, description = "A send with this provider email id already exists", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn create_email_send(
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<NewEmailSend>,
) -> impl IntoResponse {
    match resources.processor.create_email_send_record(payload).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))),
        Err(crate::error::ProcessError::Database(e))
            if matches!(
                e.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ) =>
        {
            (
                StatusCode::CONFLICT,
                Json(json!({ "error": "EmailSend already exists" })),
            )
        }
        Err(e) => {
            tracing::error!(
                name = "api.create_email_send.failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                message = "Failed to register email send"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to register email send" })),
            )
        }
    }
}
