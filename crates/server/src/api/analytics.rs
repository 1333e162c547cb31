//! Reporting endpoints.

use axum::{Extension, Json, extract::Path, response::IntoResponse};
use hyper::StatusCode;
use serde_json::json;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::analytics::{
    EmailAnalyticsOverview, NewsletterPerformance, fetch_email_analytics_overview,
    fetch_newsletter_performance,
};

/// Tag for OpenAPI documentation.
pub const ANALYTICS_TAG: &str = "Analytics";

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_overview))
        .routes(routes!(get_newsletter_performance))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/analytics/overview",
    tag = ANALYTICS_TAG,
    operation_id = "Get Email Analytics Overview",
    summary = "Delivery, open, click and bounce rates across all sends",
    responses(
        (status = 200, description = "Overview", body = EmailAnalyticsOverview, content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn get_overview(Extension(resources): Extension<AppResources>) -> impl IntoResponse {
    match fetch_email_analytics_overview(&resources.db).await {
        Ok(overview) => (StatusCode::OK, Json(json!(overview))),
        Err(e) => {
            tracing::error!(
                name = "api.get_overview.db_query_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to compute analytics overview"
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
    get,
    path = "/api/analytics/posts/{post_id}",
    tag = ANALYTICS_TAG,
    operation_id = "Get Newsletter Performance",
    summary = "Email performance of one newsletter post",
    params(
        ("post_id" = String, Path, description = "Id of the post that was sent as a newsletter")
    ),
    responses(
        (status = 200, description = "Performance figures", body = NewsletterPerformance, content_type = "application/json"),
        (status = 404, description = "Post was never sent", content_type = "application/json"),
        (status = 500, description = "Internal server error", content_type = "application/json")
    )
)]
async fn get_newsletter_performance(
    Extension(resources): Extension<AppResources>,
    Path(post_id): Path<String>,
) -> impl IntoResponse {
    match fetch_newsletter_performance(&resources.db, &post_id).await {
        Ok(Some(perf)) => (StatusCode::OK, Json(json!(perf))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No sends found for this post"})),
        ),
        Err(e) => {
            tracing::error!(
                name = "api.get_newsletter_performance.db_query_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                post_id = %post_id,
                message = "Failed to compute newsletter performance"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("DB error: {e}")})),
            )
        }
    }
}
