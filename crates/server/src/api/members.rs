//! Engagement recalculation endpoints.

use axum::{Extension, Json, extract::Path, response::IntoResponse};
use hyper::StatusCode;
use serde_json::json;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::engagement::{
    EngagementScore, recalculate_all_member_engagement, recalculate_member_engagement,
};

/// Tag for OpenAPI documentation.
pub const MEMBERS_TAG: &str = "Members";

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(recalculate_one))
        .routes(routes!(recalculate_all))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    post,
    path = "/api/members/{member_id}/engagement",
    tag = MEMBERS_TAG,
    operation_id = "Recalculate Member Engagement",
    params(
        ("member_id" = String, Path, description = "Member id")
    ),
    responses(
        (status = 200, description = "New score", body = EngagementScore, content_type = "application/json"),
        (status = 404, description = "Member not found", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn recalculate_one(
    Extension(resources): Extension<AppResources>,
    Path(member_id): Path<String>,
) -> impl IntoResponse {
    match recalculate_member_engagement(&resources.db, &member_id).await {
        Ok(Some(score)) => (StatusCode::OK, Json(json!(score))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Member not found"})),
        ),
        Err(e) => {
            tracing::error!(
                name = "api.recalculate_one.failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                member_id = %member_id,
                message = "Failed to recalculate member engagement"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            )
        }
    }
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    post,
    path = "/api/members/engagement",
    tag = MEMBERS_TAG,
    operation_id = "Recalculate All Member Engagement",
    summary = "Recalculate the score of every subscribed member",
    responses(
        (status = 200, description = "Number of members updated", content_type = "application/json", example = json!({"updated": 42})),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn recalculate_all(Extension(resources): Extension<AppResources>) -> impl IntoResponse {
    match recalculate_all_member_engagement(&resources.db).await {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))),
        Err(e) => {
            tracing::error!(
                name = "api.recalculate_all.failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to recalculate member engagement"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            )
        }
    }
}
